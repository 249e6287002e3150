// src/engine/recovery.rs

//! Startup reconciliation between the catalog and the backend.

use tracing::{info, warn};

use super::registry::SubmittedJob;
use super::scheduler::Scheduler;
use crate::catalog::Catalog;
use crate::errors::{Result, SchedulerError};
use crate::exec::ExecutionBackend;

/// Counts produced by recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub examined: usize,
    /// Tasks that already carried a job id.
    pub readopted: usize,
    /// Tasks whose job was found by name.
    pub adopted: usize,
    /// Subset of `adopted` where several jobs shared the name.
    pub ambiguous: usize,
    pub rolled_back: usize,
    pub errors: usize,
}

impl<C: Catalog, B: ExecutionBackend> Scheduler<C, B> {
    /// Rebuild the registry from every task the catalog believes is in flight.
    ///
    /// A task without a job id is looked up by its job name; when several jobs
    /// match, the first one the backend returned is adopted.
    pub async fn recover_once(&self) -> Result<RecoveryReport> {
        let tasks = self
            .catalog
            .processing_tasks()
            .map_err(SchedulerError::Catalog)?;

        let mut report = RecoveryReport {
            examined: tasks.len(),
            ..RecoveryReport::default()
        };
        let mut matched = Vec::new();

        for mut task in tasks {
            if let Some(job_id) = task.execution_job_id.clone() {
                self.registry.add(job_id, task);
                report.readopted += 1;
                continue;
            }

            let name = task.job_name();
            let candidates = self.backend.jobs_by_name(&name).await?;

            let Some(first) = candidates.first() else {
                info!(task_id = %task.id, job_name = %name, "no job found; rolling task back");
                match self.roll_back(&mut task) {
                    Ok(()) => report.rolled_back += 1,
                    Err(err) => {
                        warn!(task_id = %task.id, error = %err, "rollback failed");
                        report.errors += 1;
                    }
                }
                continue;
            };

            if candidates.len() > 1 {
                let ids: Vec<&str> = candidates.iter().map(|j| j.id.as_str()).collect();
                warn!(task_id = %task.id, job_name = %name, ?ids, "several jobs share this name; adopting the first");
                report.ambiguous += 1;
            }

            let job_id = first.id.clone();
            task.execution_job_id = Some(job_id.clone());
            if let Err(err) = self.persist_state(&task) {
                warn!(task_id = %task.id, job_id = %job_id, error = %err, "failed to record adopted job");
                report.errors += 1;
                continue;
            }

            info!(task_id = %task.id, job_id = %job_id, stage = %task.stage, "adopted job found by name");
            matched.push(SubmittedJob { job_id, task });
            report.adopted += 1;
        }

        self.registry.populate(matched);

        info!(
            examined = report.examined,
            readopted = report.readopted,
            adopted = report.adopted,
            rolled_back = report.rolled_back,
            registry = self.registry.len(),
            "recovery finished"
        );
        Ok(report)
    }
}
