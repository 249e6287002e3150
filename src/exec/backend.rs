// src/exec/backend.rs

//! Execution backend abstraction.
//!
//! The scheduler talks to an `ExecutionBackend` instead of a concrete HTTP
//! client. Production code uses [`super::ArrebolBackend`]; tests swap in a
//! scripted fake that never touches the network.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::job::JobSpec;
use crate::pipeline::JobId;

/// Job state reported once every command ran to completion.
pub const STATE_FINISHED: &str = "FINISHED";
/// Job state reported when the backend gave up on a job.
pub const STATE_FAILED: &str = "FAILED";

/// Faults raised by an [`ExecutionBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Network trouble, timeouts, 5xx or undecodable bodies. Worth retrying.
    #[error("transient backend error: {0}")]
    Transient(String),

    /// The backend refused the job, or the job could not be built.
    #[error("job submission rejected: {0}")]
    Submission(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

/// Boxed future returned by backend calls.
pub type BackendFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Remote service that runs submitted jobs.
pub trait ExecutionBackend: Send + Sync {
    /// Submit a job and return the identifier the backend assigned to it.
    fn submit_job<'a>(&'a self, job: &'a JobSpec) -> BackendFuture<'a, JobId>;

    /// Look a job up by id; `None` when the backend does not know it.
    fn job_by_id<'a>(&'a self, job_id: &'a str) -> BackendFuture<'a, Option<JobResponse>>;

    /// All jobs whose label equals `name`, in backend order.
    fn jobs_by_name<'a>(&'a self, name: &'a str) -> BackendFuture<'a, Vec<JobResponse>>;

    /// Number of jobs currently waiting in `queue_id`.
    fn waiting_jobs<'a>(&'a self, queue_id: &'a str) -> BackendFuture<'a, usize>;
}

/// Job as reported back by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: JobId,
    #[serde(default)]
    pub label: String,
    #[serde(alias = "job_state")]
    pub state: String,
    #[serde(default)]
    pub tasks: Vec<TaskResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub commands: Vec<CommandResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub command: String,
    pub state: String,
    pub exit_code: i32,
}

impl JobResponse {
    /// Whether the job reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state.eq_ignore_ascii_case(STATE_FINISHED)
            || self.state.eq_ignore_ascii_case(STATE_FAILED)
    }

    /// True when every command of every task exited 0 in state `FINISHED`.
    pub fn succeeded(&self) -> bool {
        self.tasks.iter().flat_map(|t| t.commands.iter()).all(|c| {
            c.exit_code == 0 && c.state.eq_ignore_ascii_case(STATE_FINISHED)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(state: &str, commands: &[(i32, &str)]) -> JobResponse {
        JobResponse {
            id: "j".into(),
            label: "running-t".into(),
            state: state.into(),
            tasks: vec![TaskResponse {
                id: "t#img".into(),
                state: state.into(),
                commands: commands
                    .iter()
                    .map(|(code, st)| CommandResponse {
                        command: "true".into(),
                        state: st.to_string(),
                        exit_code: *code,
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn finished_state_is_case_insensitive() {
        assert!(job("finished", &[]).is_finished());
        assert!(job("Failed", &[]).is_finished());
        assert!(!job("RUNNING", &[]).is_finished());
        assert!(!job("QUEUED", &[]).is_finished());
    }

    #[test]
    fn success_requires_every_command_ok() {
        assert!(job("FINISHED", &[(0, "FINISHED"), (0, "finished")]).succeeded());
        assert!(!job("FINISHED", &[(0, "FINISHED"), (2, "FINISHED")]).succeeded());
        assert!(!job("FINISHED", &[(0, "FAILED")]).succeeded());
    }

    #[test]
    fn decodes_backend_payload() {
        let json = r#"{
            "id": "42",
            "label": "downloading-t1",
            "job_state": "FINISHED",
            "tasks": [{"id": "t1#img", "state": "FINISHED",
                       "commands": [{"command": "ls", "state": "FINISHED", "exit_code": 0}]}]
        }"#;
        let job: JobResponse = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "42");
        assert!(job.is_finished());
        assert!(job.succeeded());
    }

    #[test]
    fn only_transient_errors_classify_as_transient() {
        assert!(BackendError::Transient("timeout".into()).is_transient());
        assert!(!BackendError::Submission("400".into()).is_transient());
    }
}
