// src/engine/cycle.rs

//! Scheduling cycle: select eligible tasks and submit them.

use tracing::{debug, error, info, warn};

use super::scheduler::Scheduler;
use crate::catalog::Catalog;
use crate::errors::{Result, SchedulerError};
use crate::exec::{ExecutionBackend, build_job};
use crate::pipeline::{Stage, Task};
use crate::selector::group_by_user;

/// Stages pulled from the catalog, most advanced first.
pub const SELECTION_ORDER: [Stage; 3] = [Stage::Ready, Stage::Downloaded, Stage::Created];

/// What happened to one selected task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { job_id: String },
    /// The job was rejected or could not be built; the task is now `failed`.
    Failed { reason: String },
}

/// Counts produced by one scheduling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub capacity: usize,
    pub selected: usize,
    pub submitted: usize,
    pub failed: usize,
    /// Tasks skipped because the catalog could not be written.
    pub errors: usize,
}

impl<C: Catalog, B: ExecutionBackend> Scheduler<C, B> {
    /// Run one scheduling cycle.
    ///
    /// Blocks while the backend is unreachable. Per-task failures are counted
    /// in the report and never abort the cycle.
    pub async fn schedule_once(&self) -> Result<ScheduleReport> {
        let capacity = self.available_capacity().await?;
        let selected = self.select_tasks(capacity)?;

        let mut report = ScheduleReport {
            capacity,
            selected: selected.len(),
            ..ScheduleReport::default()
        };

        for task in selected {
            let task_id = task.id.clone();
            match self.submit_task(task).await {
                Ok(SubmitOutcome::Submitted { .. }) => report.submitted += 1,
                Ok(SubmitOutcome::Failed { .. }) => report.failed += 1,
                Err(err) => {
                    error!(task_id = %task_id, error = %err, "failed to submit task");
                    report.errors += 1;
                }
            }
        }

        info!(
            capacity = report.capacity,
            selected = report.selected,
            submitted = report.submitted,
            failed = report.failed,
            errors = report.errors,
            "scheduling cycle finished"
        );
        Ok(report)
    }

    /// Free backend slots: the configured maximum minus the queue depth.
    pub async fn available_capacity(&self) -> Result<usize> {
        let waiting = self.backend.waiting_jobs(&self.options.queue_id).await?;
        let capacity = self.options.max_waiting_jobs.saturating_sub(waiting);
        debug!(
            queue_id = %self.options.queue_id,
            waiting,
            capacity,
            "backend capacity"
        );
        Ok(capacity)
    }

    /// Pick up to `capacity` tasks across [`SELECTION_ORDER`].
    ///
    /// Each stage is fully selected before the next one sees what is left.
    pub fn select_tasks(&self, capacity: usize) -> Result<Vec<Task>> {
        let mut selected = Vec::new();

        for stage in SELECTION_ORDER {
            let remaining = capacity.saturating_sub(selected.len());
            if remaining == 0 {
                debug!(stage = %stage, "no capacity left for stage");
                break;
            }

            let candidates = self
                .catalog
                .tasks_by_stage(stage)
                .map_err(SchedulerError::Catalog)?;
            let picked = self.selector.select(remaining, group_by_user(candidates));

            info!(
                stage = %stage,
                remaining,
                picked = picked.len(),
                selector = self.selector.version(),
                "selected tasks"
            );
            selected.extend(picked);
        }

        Ok(selected)
    }

    /// Advance `task`, submit its job and record the outcome.
    ///
    /// The new stage is persisted before the backend is contacted.
    pub async fn submit_task(&self, mut task: Task) -> Result<SubmitOutcome> {
        let Some(next) = task.stage.next() else {
            warn!(task_id = %task.id, stage = %task.stage, "task has no next stage; skipping");
            return Ok(SubmitOutcome::Failed {
                reason: format!("no stage after {}", task.stage),
            });
        };

        task.set_state(next, None, None);
        self.persist_state(&task)?;

        let submitted = match build_job(&task, &self.options.tags, &self.options.work_root) {
            Ok(job) => self.backend.submit_job(&job).await,
            Err(err) => Err(err),
        };

        match submitted {
            Ok(job_id) => {
                task.execution_job_id = Some(job_id.clone());
                self.registry.add(job_id.clone(), task.clone());
                self.persist_state(&task)?;
                self.touch(&task)?;

                info!(task_id = %task.id, job_id = %job_id, stage = %task.stage, "task submitted");
                Ok(SubmitOutcome::Submitted { job_id })
            }
            Err(err) => {
                warn!(task_id = %task.id, stage = %task.stage, error = %err, "submission failed; marking task failed");

                task.set_state(Stage::Failed, None, None);
                self.persist_state(&task)?;
                self.touch(&task)?;

                Ok(SubmitOutcome::Failed {
                    reason: err.to_string(),
                })
            }
        }
    }
}
