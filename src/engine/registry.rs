// src/engine/registry.rs

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::pipeline::{JobId, Task};

/// A job outstanding at the backend together with the task it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub task: Task,
}

/// In-memory map of outstanding jobs.
///
/// Not persisted; recovery rebuilds it from the catalog after a restart.
#[derive(Debug, Default)]
pub struct SubmissionRegistry {
    jobs: Mutex<BTreeMap<JobId, Task>>,
}

impl SubmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<JobId, Task>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `task` under `job_id`, replacing any previous entry.
    pub fn add(&self, job_id: impl Into<JobId>, task: Task) {
        self.lock().insert(job_id.into(), task);
    }

    /// Add many entries under a single lock.
    pub fn populate(&self, jobs: impl IntoIterator<Item = SubmittedJob>) {
        let mut map = self.lock();
        for job in jobs {
            map.insert(job.job_id, job.task);
        }
    }

    /// Copy of every entry, ordered by job id.
    pub fn snapshot(&self) -> Vec<SubmittedJob> {
        self.lock()
            .iter()
            .map(|(job_id, task)| SubmittedJob {
                job_id: job_id.clone(),
                task: task.clone(),
            })
            .collect()
    }

    /// Drop every listed job id in one pass. Returns how many were present.
    pub fn remove_all<'a>(&self, job_ids: impl IntoIterator<Item = &'a JobId>) -> usize {
        let mut map = self.lock();
        job_ids
            .into_iter()
            .filter(|id| map.remove(*id).is_some())
            .count()
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.lock().contains_key(job_id)
    }

    pub fn get(&self, job_id: &str) -> Option<Task> {
        self.lock().get(job_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
