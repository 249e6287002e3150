// src/exec/arrebol.rs

//! HTTP client for the Arrebol execution service.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::backend::{BackendError, BackendFuture, ExecutionBackend, JobResponse};
use super::job::JobSpec;
use crate::config::model::ArrebolSection;
use crate::errors::{Result, SchedulerError};
use crate::pipeline::JobId;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: JobId,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    waiting_jobs: usize,
}

/// [`ExecutionBackend`] speaking Arrebol's REST API.
#[derive(Debug, Clone)]
pub struct ArrebolBackend {
    client: Client,
    base_url: String,
    queue_id: String,
}

impl ArrebolBackend {
    pub fn new(cfg: &ArrebolSection, queue_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| SchedulerError::ConfigError(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            queue_id: queue_id.to_string(),
        })
    }

    fn jobs_url(&self) -> String {
        format!("{}/queues/{}/jobs", self.base_url, self.queue_id)
    }

    async fn submit(&self, job: &JobSpec) -> std::result::Result<JobId, BackendError> {
        let response = self
            .client
            .post(self.jobs_url())
            .json(job)
            .send()
            .await
            .map_err(transient)?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Submission(format!(
                "job [{}] rejected with {status}: {body}",
                job.label
            )));
        }

        let created: SubmitResponse = decode(response).await?;
        info!(job_id = %created.id, label = %job.label, "job submitted to arrebol");
        Ok(created.id)
    }

    async fn get_job(&self, job_id: &str) -> std::result::Result<Option<JobResponse>, BackendError> {
        let url = format!("{}/{}", self.jobs_url(), job_id);
        let response = self.client.get(url).send().await.map_err(transient)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(job_id, "job not found in arrebol");
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    async fn get_jobs_by_name(&self, name: &str) -> std::result::Result<Vec<JobResponse>, BackendError> {
        let response = self
            .client
            .get(self.jobs_url())
            .query(&[("label", name)])
            .send()
            .await
            .map_err(transient)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        decode(response).await
    }

    async fn get_waiting_jobs(&self, queue_id: &str) -> std::result::Result<usize, BackendError> {
        let url = format!("{}/queues/{}", self.base_url, queue_id);
        let response = self.client.get(url).send().await.map_err(transient)?;
        let queue: QueueResponse = decode(response).await?;
        debug!(queue_id, waiting = queue.waiting_jobs, "arrebol queue depth");
        Ok(queue.waiting_jobs)
    }
}

impl ExecutionBackend for ArrebolBackend {
    fn submit_job<'a>(&'a self, job: &'a JobSpec) -> BackendFuture<'a, JobId> {
        Box::pin(self.submit(job))
    }

    fn job_by_id<'a>(&'a self, job_id: &'a str) -> BackendFuture<'a, Option<JobResponse>> {
        Box::pin(self.get_job(job_id))
    }

    fn jobs_by_name<'a>(&'a self, name: &'a str) -> BackendFuture<'a, Vec<JobResponse>> {
        Box::pin(self.get_jobs_by_name(name))
    }

    fn waiting_jobs<'a>(&'a self, queue_id: &'a str) -> BackendFuture<'a, usize> {
        Box::pin(self.get_waiting_jobs(queue_id))
    }
}

fn transient(err: reqwest::Error) -> BackendError {
    BackendError::Transient(err.to_string())
}

/// Decode a JSON body; any non-success status is treated as transient.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let url = response.url().to_string();
        return Err(BackendError::Transient(format!("{url} answered {status}")));
    }
    response.json::<T>().await.map_err(transient)
}
