// src/pipeline/task.rs

//! Persisted task record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::stage::{Phase, Stage};
use super::{JobId, TaskId};

/// Availability flag kept next to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Available,
    /// Removed by its owner; never selected again.
    Purged,
}

/// Container image pin for one execution phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseImage {
    /// Name of the script tag entry to run (see `[[tags.<phase>]]`).
    pub tag: String,
    /// Content digest appended to the repository (`repo@digest`).
    pub digest: String,
}

/// A unit of work moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub stage: Stage,

    /// Owning user; the selector interleaves users fairly.
    pub user: String,
    /// Higher is more urgent.
    #[serde(default)]
    pub priority: i32,
    pub creation_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// `None` until the task's current job has been accepted by the backend.
    #[serde(default)]
    pub execution_job_id: Option<JobId>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub error: Option<String>,

    pub dataset: String,
    pub region: String,
    pub image_date: NaiveDate,

    pub input_downloading: PhaseImage,
    pub preprocessing: PhaseImage,
    pub processing: PhaseImage,
}

impl Task {
    /// Deterministic backend job name, `"<stage>-<taskId>"`.
    ///
    /// Recovery relies on this to re-discover jobs submitted just before a crash.
    pub fn job_name(&self) -> String {
        format!("{}-{}", self.stage, self.id)
    }

    pub fn phase_image(&self, phase: Phase) -> &PhaseImage {
        match phase {
            Phase::InputDownloading => &self.input_downloading,
            Phase::Preprocessing => &self.preprocessing,
            Phase::Processing => &self.processing,
        }
    }

    /// Overwrite the mutable execution state in one go.
    ///
    /// Every scheduler write marks the task available again.
    pub fn set_state(&mut self, stage: Stage, error: Option<String>, job_id: Option<JobId>) {
        self.stage = stage;
        self.status = TaskStatus::Available;
        self.error = error;
        self.execution_job_id = job_id;
    }
}
