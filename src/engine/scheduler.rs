// src/engine/scheduler.rs

use std::fmt;
use std::time::Duration;

use tracing::warn;

use super::registry::SubmissionRegistry;
use crate::catalog::Catalog;
use crate::config::model::{ConfigFile, TagsSection};
use crate::errors::{Result, SchedulerError};
use crate::exec::{ExecutionBackend, RetryPolicy, Retrying};
use crate::pipeline::Task;
use crate::selector::{RoundRobin, Selector};

/// Settings the phases need beyond their collaborators.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Backend queue polled for depth.
    pub queue_id: String,
    /// Fixed slot count; capacity is this minus the queue depth.
    pub max_waiting_jobs: usize,
    pub work_root: String,
    pub retry: RetryPolicy,
    pub tags: TagsSection,
}

impl SchedulerOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            queue_id: cfg.scheduler.queue_id.clone(),
            max_waiting_jobs: cfg.scheduler.max_waiting_jobs,
            work_root: cfg.scheduler.work_root.clone(),
            retry: RetryPolicy::new(Duration::from_secs(cfg.arrebol.retry_delay_secs)),
            tags: cfg.tags.clone(),
        }
    }
}

/// The scheduling core: catalog, backend, selector and submission registry.
///
/// Phases are implemented in sibling modules: [`super::recovery`],
/// [`super::cycle`] and [`super::checker`].
pub struct Scheduler<C, B> {
    pub(super) catalog: C,
    pub(super) backend: Retrying<B>,
    pub(super) selector: Box<dyn Selector>,
    pub(super) registry: SubmissionRegistry,
    pub(super) options: SchedulerOptions,
}

impl<C: Catalog, B: ExecutionBackend> fmt::Debug for Scheduler<C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("catalog", &self.catalog)
            .field("selector", &self.selector.version())
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: Catalog, B: ExecutionBackend> Scheduler<C, B> {
    /// Scheduler using the round-robin selector.
    pub fn new(catalog: C, backend: B, options: SchedulerOptions) -> Self {
        Self::with_selector(catalog, backend, options, Box::new(RoundRobin))
    }

    pub fn with_selector(
        catalog: C,
        backend: B,
        options: SchedulerOptions,
        selector: Box<dyn Selector>,
    ) -> Self {
        let backend = Retrying::new(backend, options.retry);
        Self {
            catalog,
            backend,
            selector,
            registry: SubmissionRegistry::new(),
            options,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn backend(&self) -> &B {
        self.backend.inner()
    }

    pub fn registry(&self) -> &SubmissionRegistry {
        &self.registry
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn selector_version(&self) -> &str {
        self.selector.version()
    }

    pub(super) fn persist_state(&self, task: &Task) -> Result<()> {
        self.catalog
            .update_task_state(task)
            .map_err(SchedulerError::Catalog)
    }

    pub(super) fn touch(&self, task: &Task) -> Result<()> {
        self.catalog
            .touch_timestamp(task)
            .map_err(SchedulerError::Catalog)
    }

    /// Move `task` back one stage and forget its job.
    ///
    /// Stages without a predecessor keep their stage; only the job id is cleared.
    pub(super) fn roll_back(&self, task: &mut Task) -> Result<()> {
        let target = match task.stage.previous() {
            Some(previous) => previous,
            None => {
                warn!(
                    task_id = %task.id,
                    stage = %task.stage,
                    "no previous stage to roll back to; clearing job id only"
                );
                task.stage
            }
        };

        task.set_state(target, None, None);
        self.persist_state(task)
    }
}
