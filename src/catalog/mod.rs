// src/catalog/mod.rs

//! Persistent task store.
//!
//! The scheduler reads candidate tasks and writes state transitions through
//! the [`Catalog`] trait. Every call hits the store directly so phases always
//! observe each other's writes.

use std::fmt::Debug;

use anyhow::Result;

use crate::pipeline::{Stage, Task};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileCatalog;
pub use memory::InMemoryCatalog;

/// Abstract task store interface.
///
/// Queries only return tasks whose status is `available`.
pub trait Catalog: Send + Sync + Debug {
    fn tasks_by_stage(&self, stage: Stage) -> Result<Vec<Task>>;

    /// Tasks in any stage for which [`Stage::is_processing`] holds.
    fn processing_tasks(&self) -> Result<Vec<Task>>;

    /// Persist `stage`, `status`, `error` and `execution_job_id` of `task`.
    ///
    /// Fails if the store has no task with that id.
    fn update_task_state(&self, task: &Task) -> Result<()>;

    /// Refresh the task's `updated_at` to now.
    fn touch_timestamp(&self, task: &Task) -> Result<()>;
}
