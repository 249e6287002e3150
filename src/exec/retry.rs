// src/exec/retry.rs

//! Retry-forever wrapper around backend calls.
//!
//! Every call the scheduler makes to the execution backend goes through a
//! [`Retrying`] backend. Retryable faults are logged and retried after a fixed
//! delay with no attempt cap; everything else is handed back to the caller.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::backend::{BackendError, ExecutionBackend, JobResponse};
use super::job::JobSpec;
use crate::pipeline::JobId;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Delay between attempts plus the predicate deciding what gets retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    delay: Duration,
    retryable: fn(&BackendError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Retry transient faults every `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            retryable: BackendError::is_transient,
        }
    }

    pub fn with_predicate(mut self, retryable: fn(&BackendError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Call `op` until it succeeds or fails with a non-retryable error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if (self.retryable)(&err) => {
                    warn!(
                        operation = what,
                        attempt,
                        delay_secs = self.delay.as_secs(),
                        error = %err,
                        "backend call failed; retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Backend decorator that routes every call through a [`RetryPolicy`].
#[derive(Debug)]
pub struct Retrying<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: ExecutionBackend> Retrying<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub async fn submit_job(&self, job: &JobSpec) -> Result<JobId, BackendError> {
        let what = format!("submit job [{}]", job.label);
        self.policy.run(&what, || self.inner.submit_job(job)).await
    }

    pub async fn job_by_id(&self, job_id: &str) -> Result<Option<JobResponse>, BackendError> {
        let what = format!("get job by id [{job_id}]");
        self.policy.run(&what, || self.inner.job_by_id(job_id)).await
    }

    pub async fn jobs_by_name(&self, name: &str) -> Result<Vec<JobResponse>, BackendError> {
        let what = format!("get jobs by name [{name}]");
        self.policy.run(&what, || self.inner.jobs_by_name(name)).await
    }

    pub async fn waiting_jobs(&self, queue_id: &str) -> Result<usize, BackendError> {
        let what = format!("get waiting jobs in queue [{queue_id}]");
        self.policy.run(&what, || self.inner.waiting_jobs(queue_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(Duration::from_secs(5));
        let started = tokio::time::Instant::now();

        let result = policy
            .run("flaky", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(BackendError::Transient("down".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn submission_fault_surfaces_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), _> = policy
            .run("reject", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BackendError::Submission("bad job".into())) }
            })
            .await;

        assert_eq!(result, Err(BackendError::Submission("bad job".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_predicate_controls_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(Duration::from_secs(1)).with_predicate(|_| false);

        let result: Result<(), _> = policy
            .run("never", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BackendError::Transient("down".into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(policy.delay(), Duration::from_secs(1));
    }
}
