use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use saps_scheduler::exec::{
    BackendError, BackendFuture, ExecutionBackend, JobResponse, JobSpec,
};
use saps_scheduler::pipeline::JobId;

#[derive(Debug, Default)]
struct State {
    /// Known jobs in insertion order.
    jobs: Vec<JobResponse>,
    waiting: usize,
    submitted: Vec<JobSpec>,
    rejected_labels: BTreeSet<String>,
    pending_transient_failures: usize,
    calls: usize,
    next_id: u64,
}

/// A scripted execution backend that:
/// - hands out ids `job-1`, `job-2`, ... and records every submitted job
/// - answers lookups from jobs the test put in place
/// - can fail the next N calls transiently, or reject given job labels.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_waiting(self, waiting: usize) -> Self {
        self.set_waiting(waiting);
        self
    }

    pub fn set_waiting(&self, waiting: usize) {
        self.lock().waiting = waiting;
    }

    /// Insert a job, replacing any job with the same id.
    pub fn put_job(&self, job: JobResponse) {
        let mut state = self.lock();
        match state.jobs.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => *existing = job,
            None => state.jobs.push(job),
        }
    }

    /// Refuse submissions of jobs labelled `label`.
    pub fn reject_label(&self, label: &str) {
        self.lock().rejected_labels.insert(label.to_string());
    }

    /// Make the next `n` calls (of any kind) fail transiently.
    pub fn fail_next(&self, n: usize) {
        self.lock().pending_transient_failures = n;
    }

    pub fn submitted(&self) -> Vec<JobSpec> {
        self.lock().submitted.clone()
    }

    pub fn submitted_labels(&self) -> Vec<String> {
        self.lock().submitted.iter().map(|j| j.label.clone()).collect()
    }

    pub fn calls(&self) -> usize {
        self.lock().calls
    }


    fn enter(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.lock();
        state.calls += 1;
        if state.pending_transient_failures > 0 {
            state.pending_transient_failures -= 1;
            return Err(BackendError::Transient("injected failure".to_string()));
        }
        Ok(state)
    }

    fn do_submit(&self, job: &JobSpec) -> Result<JobId, BackendError> {
        let mut state = self.enter()?;
        if state.rejected_labels.contains(&job.label) {
            return Err(BackendError::Submission(format!("label {} rejected", job.label)));
        }

        state.next_id += 1;
        let id = format!("job-{}", state.next_id);
        state.submitted.push(job.clone());
        state.jobs.push(JobResponse {
            id: id.clone(),
            label: job.label.clone(),
            state: "QUEUED".to_string(),
            tasks: Vec::new(),
        });
        Ok(id)
    }
}

impl ExecutionBackend for FakeBackend {
    fn submit_job<'a>(&'a self, job: &'a JobSpec) -> BackendFuture<'a, JobId> {
        let result = self.do_submit(job);
        Box::pin(async move { result })
    }

    fn job_by_id<'a>(&'a self, job_id: &'a str) -> BackendFuture<'a, Option<JobResponse>> {
        let result = self
            .enter()
            .map(|state| state.jobs.iter().find(|j| j.id == job_id).cloned());
        Box::pin(async move { result })
    }

    fn jobs_by_name<'a>(&'a self, name: &'a str) -> BackendFuture<'a, Vec<JobResponse>> {
        let result = self.enter().map(|state| {
            state
                .jobs
                .iter()
                .filter(|j| j.label == name)
                .cloned()
                .collect()
        });
        Box::pin(async move { result })
    }

    fn waiting_jobs<'a>(&'a self, _queue_id: &'a str) -> BackendFuture<'a, usize> {
        let result = self.enter().map(|state| state.waiting);
        Box::pin(async move { result })
    }
}
