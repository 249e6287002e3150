#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use saps_scheduler::config::{
    ArrebolSection, CatalogSection, ConfigFile, RawConfigFile, SchedulerSection, ScriptTag,
    TagsSection,
};
use saps_scheduler::engine::SchedulerOptions;
use saps_scheduler::exec::{CommandResponse, JobResponse, TaskResponse};
use saps_scheduler::pipeline::{Phase, PhaseImage, Stage, Task, TaskStatus};

/// Tag name every [`TaskBuilder`] task and every [`ConfigBuilder`] config use.
pub const DEFAULT_TAG: &str = "default";

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Builder for `Task` with sensible defaults.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        let image = || PhaseImage {
            tag: DEFAULT_TAG.to_string(),
            digest: "sha256:feed".to_string(),
        };
        Self {
            task: Task {
                id: id.to_string(),
                stage: Stage::Created,
                user: "user".to_string(),
                priority: 0,
                creation_time: epoch(),
                updated_at: epoch(),
                execution_job_id: None,
                status: TaskStatus::Available,
                error: None,
                dataset: "landsat_8".to_string(),
                region: "215065".to_string(),
                image_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                input_downloading: image(),
                preprocessing: image(),
                processing: image(),
            },
        }
    }

    pub fn user(mut self, user: &str) -> Self {
        self.task.user = user.to_string();
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.task.stage = stage;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.task.priority = priority;
        self
    }

    /// Creation time `minutes` after a fixed epoch.
    pub fn created_at_minute(mut self, minutes: i64) -> Self {
        self.task.creation_time = epoch() + Duration::minutes(minutes);
        self
    }

    pub fn job_id(mut self, job_id: &str) -> Self {
        self.task.execution_job_id = Some(job_id.to_string());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn tag(mut self, phase: Phase, tag: &str) -> Self {
        match phase {
            Phase::InputDownloading => self.task.input_downloading.tag = tag.to_string(),
            Phase::Preprocessing => self.task.preprocessing.tag = tag.to_string(),
            Phase::Processing => self.task.processing.tag = tag.to_string(),
        }
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with one script tag named [`DEFAULT_TAG`] per phase.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let tag = |repo: &str| ScriptTag {
            name: DEFAULT_TAG.to_string(),
            docker_repository: repo.to_string(),
            docker_tag: DEFAULT_TAG.to_string(),
            memory_usage: "1Gi".to_string(),
            cpu_usage: "1".to_string(),
        };
        Self {
            config: RawConfigFile {
                scheduler: SchedulerSection::default(),
                arrebol: ArrebolSection::default(),
                catalog: CatalogSection::default(),
                tags: TagsSection {
                    inputdownloading: vec![tag("saps/inputdownloader")],
                    preprocessing: vec![tag("saps/preprocessor")],
                    processing: vec![tag("saps/worker")],
                },
            },
        }
    }

    pub fn max_waiting_jobs(mut self, n: usize) -> Self {
        self.config.scheduler.max_waiting_jobs = n;
        self
    }

    pub fn retry_delay_secs(mut self, secs: u64) -> Self {
        self.config.arrebol.retry_delay_secs = secs;
        self
    }

    pub fn work_root(mut self, root: &str) -> Self {
        self.config.scheduler.work_root = root.to_string();
        self
    }

    pub fn catalog_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.catalog.path = path.into();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn options(self) -> SchedulerOptions {
        SchedulerOptions::from_config(&self.build())
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal job with one command per exit code.
///
/// State is `FINISHED` when every code is 0, `FAILED` otherwise.
pub fn finished_job(id: &str, label: &str, exit_codes: &[i32]) -> JobResponse {
    let ok = exit_codes.iter().all(|c| *c == 0);
    let state = if ok { "FINISHED" } else { "FAILED" };
    JobResponse {
        id: id.to_string(),
        label: label.to_string(),
        state: state.to_string(),
        tasks: vec![TaskResponse {
            id: format!("{label}#task"),
            state: state.to_string(),
            commands: exit_codes
                .iter()
                .map(|code| CommandResponse {
                    command: "bash run.sh".to_string(),
                    state: if *code == 0 { "FINISHED" } else { "FAILED" }.to_string(),
                    exit_code: *code,
                })
                .collect(),
        }],
    }
}

/// Job in an arbitrary state with no commands.
pub fn job_in_state(id: &str, label: &str, state: &str) -> JobResponse {
    JobResponse {
        id: id.to_string(),
        label: label.to_string(),
        state: state.to_string(),
        tasks: Vec::new(),
    }
}
