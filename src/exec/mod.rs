// src/exec/mod.rs

//! Execution backend layer.
//!
//! - [`backend`] defines the `ExecutionBackend` trait and the job response model.
//! - [`job`] turns a task into the job document the backend runs.
//! - [`retry`] wraps a backend so transient faults are retried forever.
//! - [`arrebol`] is the production HTTP implementation.

pub mod arrebol;
pub mod backend;
pub mod job;
pub mod retry;

pub use arrebol::ArrebolBackend;
pub use backend::{
    BackendError, BackendFuture, CommandResponse, ExecutionBackend, JobResponse, TaskResponse,
};
pub use job::{JobSpec, JobTaskSpec, build_job};
pub use retry::{RetryPolicy, Retrying};
