// src/pipeline/mod.rs

//! Task pipeline model.
//!
//! - [`stage`] holds the fixed pipeline stages and the forward/backward
//!   transition tables used by the scheduler, checker and recovery.
//! - [`task`] holds the persisted task record and its per-phase image metadata.

pub mod stage;
pub mod task;

pub use stage::{Phase, Stage};
pub use task::{PhaseImage, Task, TaskStatus};

/// Opaque task identifier as stored in the catalog.
pub type TaskId = String;

/// Job identifier assigned by the execution backend.
pub type JobId = String;
