// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::pipeline::Phase;

/// Configuration exactly as read from TOML.
///
/// ```toml
/// [scheduler]
/// queue_id = "default"
/// max_waiting_jobs = 20
///
/// [arrebol]
/// base_url = "http://127.0.0.1:8080"
///
/// [catalog]
/// path = "tasks.json"
///
/// [[tags.processing]]
/// name = "ufcg-sebal"
/// docker_repository = "fogbow/worker"
/// docker_tag = "ufcg-sebal"
/// memory_usage = "4Gi"
/// cpu_usage = "2"
/// ```
///
/// Every section is optional. Turn it into a [`ConfigFile`] with `TryFrom`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub arrebol: ArrebolSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub tags: TagsSection,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub arrebol: ArrebolSection,
    pub catalog: CatalogSection,
    pub tags: TagsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            scheduler: raw.scheduler,
            arrebol: raw.arrebol,
            catalog: raw.catalog,
            tags: raw.tags,
        }
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Backend queue jobs are submitted to and whose depth bounds capacity.
    #[serde(default = "default_queue_id")]
    pub queue_id: String,

    /// Upper bound on jobs waiting at the backend.
    #[serde(default = "default_max_waiting_jobs")]
    pub max_waiting_jobs: usize,

    #[serde(default = "default_period_secs")]
    pub submission_period_secs: u64,

    #[serde(default = "default_period_secs")]
    pub checker_period_secs: u64,

    /// Shared directory root the job commands work under.
    #[serde(default = "default_work_root")]
    pub work_root: String,
}

fn default_queue_id() -> String {
    "default".to_string()
}

fn default_max_waiting_jobs() -> usize {
    20
}

fn default_period_secs() -> u64 {
    5
}

fn default_work_root() -> String {
    "/nfs".to_string()
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            queue_id: default_queue_id(),
            max_waiting_jobs: default_max_waiting_jobs(),
            submission_period_secs: default_period_secs(),
            checker_period_secs: default_period_secs(),
            work_root: default_work_root(),
        }
    }
}

/// `[arrebol]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrebolSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds to wait between attempts of a failed backend call.
    #[serde(default = "default_period_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ArrebolSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            retry_delay_secs: default_period_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// `[catalog]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    /// JSON file holding the task set. Relative paths resolve against the
    /// working directory.
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("tasks.json")
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

/// Named container image usable by one phase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptTag {
    pub name: String,
    pub docker_repository: String,
    pub docker_tag: String,
    pub memory_usage: String,
    pub cpu_usage: String,
}

/// `[[tags.<phase>]]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsSection {
    #[serde(default, alias = "inputdownloader")]
    pub inputdownloading: Vec<ScriptTag>,
    #[serde(default)]
    pub preprocessing: Vec<ScriptTag>,
    #[serde(default)]
    pub processing: Vec<ScriptTag>,
}

impl TagsSection {
    pub fn for_phase(&self, phase: Phase) -> &[ScriptTag] {
        match phase {
            Phase::InputDownloading => &self.inputdownloading,
            Phase::Preprocessing => &self.preprocessing,
            Phase::Processing => &self.processing,
        }
    }

    /// Tag entry named `name` for `phase`, if configured.
    pub fn find(&self, phase: Phase, name: &str) -> Option<&ScriptTag> {
        self.for_phase(phase).iter().find(|t| t.name == name)
    }
}
