// src/engine/checker.rs

//! Completion checker: poll outstanding jobs and apply terminal transitions.

use tracing::{debug, error, info};

use super::registry::SubmittedJob;
use super::scheduler::Scheduler;
use crate::catalog::Catalog;
use crate::errors::Result;
use crate::exec::ExecutionBackend;
use crate::pipeline::{JobId, Stage};

/// Counts produced by one completion check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub checked: usize,
    /// Jobs still queued or running.
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs the backend no longer knows; their tasks were rolled back.
    pub lost: usize,
    pub errors: usize,
}

enum Verdict {
    Pending,
    Succeeded,
    Failed,
    Lost,
}

impl<C: Catalog, B: ExecutionBackend> Scheduler<C, B> {
    /// Poll every registry entry once, then prune the finished ones together.
    pub async fn check_once(&self) -> CheckReport {
        let jobs = self.registry.snapshot();
        let mut report = CheckReport {
            checked: jobs.len(),
            ..CheckReport::default()
        };
        let mut done: Vec<JobId> = Vec::new();

        debug!(jobs = jobs.len(), "checking submitted jobs");

        for job in jobs {
            let job_id = job.job_id.clone();
            match self.check_job(job).await {
                Ok(Verdict::Pending) => report.pending += 1,
                Ok(verdict) => {
                    match verdict {
                        Verdict::Succeeded => report.succeeded += 1,
                        Verdict::Failed => report.failed += 1,
                        Verdict::Lost => report.lost += 1,
                        Verdict::Pending => {}
                    }
                    done.push(job_id);
                }
                Err(err) => {
                    error!(job_id = %job_id, error = %err, "failed to check job; keeping it tracked");
                    report.errors += 1;
                }
            }
        }

        let removed = self.registry.remove_all(&done);
        info!(
            checked = report.checked,
            pending = report.pending,
            succeeded = report.succeeded,
            failed = report.failed,
            lost = report.lost,
            removed,
            "completion check finished"
        );
        report
    }

    async fn check_job(&self, job: SubmittedJob) -> Result<Verdict> {
        let SubmittedJob { job_id, mut task } = job;

        let Some(response) = self.backend.job_by_id(&job_id).await? else {
            info!(job_id = %job_id, task_id = %task.id, stage = %task.stage, "job not found; rolling task back");
            self.roll_back(&mut task)?;
            return Ok(Verdict::Lost);
        };

        if !response.is_finished() {
            debug!(job_id = %job_id, state = %response.state, "job not finished yet");
            return Ok(Verdict::Pending);
        }

        let verdict = if response.succeeded() {
            let next = task.stage.next().unwrap_or(Stage::Finished);
            info!(job_id = %job_id, task_id = %task.id, from = %task.stage, to = %next, "job succeeded");
            task.set_state(next, None, None);
            Verdict::Succeeded
        } else {
            let message = format!("error while execute {} phase", task.stage);
            info!(job_id = %job_id, task_id = %task.id, stage = %task.stage, "job failed");
            task.set_state(Stage::Failed, Some(message), None);
            Verdict::Failed
        };

        self.persist_state(&task)?;
        self.touch(&task)?;
        Ok(verdict)
    }
}
