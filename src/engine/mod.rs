// src/engine/mod.rs

//! Scheduling engine.
//!
//! - [`registry`] tracks jobs outstanding at the backend.
//! - [`scheduler`] owns the catalog, backend, selector and registry.
//! - [`recovery`], [`cycle`] and [`checker`] are the three phases, each an
//!   `impl` block on [`Scheduler`].
//! - [`runtime`] drives the phases on their intervals until shutdown.

pub mod checker;
pub mod cycle;
pub mod recovery;
pub mod registry;
pub mod runtime;
pub mod scheduler;

pub use checker::CheckReport;
pub use cycle::{SELECTION_ORDER, ScheduleReport, SubmitOutcome};
pub use recovery::RecoveryReport;
pub use registry::{SubmissionRegistry, SubmittedJob};
pub use runtime::{Runtime, RuntimeOptions};
pub use scheduler::{Scheduler, SchedulerOptions};
