// src/exec/job.rs

//! Building backend job documents from tasks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::backend::BackendError;
use crate::config::model::TagsSection;
use crate::pipeline::{Phase, Task};

pub const REQUIREMENT_IMAGE: &str = "image";
pub const REQUIREMENT_CPU: &str = "CPUUsage";
pub const REQUIREMENT_RAM: &str = "RAMUsage";

/// Entry script shipped in every SAPS image.
const RUN_SCRIPT: &str = "/home/saps/run.sh";

/// Job document submitted to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub label: String,
    #[serde(rename = "tasks_specs")]
    pub tasks: Vec<JobTaskSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTaskSpec {
    pub id: String,
    pub requirements: BTreeMap<String, String>,
    pub commands: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Build the job that moves `task` out of its current stage.
///
/// `task.stage` must already hold the stage being entered; the label and the
/// phase are both derived from it. A task pinned to a tag the config does not
/// know is a submission fault.
pub fn build_job(task: &Task, tags: &TagsSection, work_root: &str) -> Result<JobSpec, BackendError> {
    let phase = Phase::for_stage(task.stage);
    let pin = task.phase_image(phase);

    let tag = tags.find(phase, &pin.tag).ok_or_else(|| {
        BackendError::Submission(format!(
            "no {} script tag named '{}' for task {}",
            phase.as_str(),
            pin.tag,
            task.id
        ))
    })?;

    let image = format!("{}@{}", tag.docker_repository, pin.digest);

    let mut requirements = BTreeMap::new();
    requirements.insert(REQUIREMENT_IMAGE.to_string(), image.clone());
    requirements.insert(REQUIREMENT_CPU.to_string(), tag.cpu_usage.clone());
    requirements.insert(REQUIREMENT_RAM.to_string(), tag.memory_usage.clone());

    Ok(JobSpec {
        label: task.job_name(),
        tasks: vec![JobTaskSpec {
            id: format!("{}#{}", task.id, image),
            requirements,
            commands: command_list(task, phase, work_root),
            metadata: BTreeMap::new(),
        }],
    })
}

fn command_list(task: &Task, phase: Phase, work_root: &str) -> Vec<String> {
    let root = format!("{}/{}", work_root.trim_end_matches('/'), task.id);
    let phase_dir = format!("{root}/{}", phase.as_str());

    vec![
        format!("rm -rf {phase_dir}"),
        format!("mkdir -p {phase_dir}"),
        format!(
            "bash {RUN_SCRIPT} {root} {} {} {}",
            task.dataset,
            task.region,
            task.image_date.format("%Y-%m-%d")
        ),
    ]
}
