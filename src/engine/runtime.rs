// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use super::scheduler::Scheduler;
use crate::catalog::Catalog;
use crate::errors::Result;
use crate::exec::ExecutionBackend;

/// Runtime options derived from config and CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub submission_period: Duration,
    pub checker_period: Duration,
    /// Run recovery, one scheduling cycle and one check, then return (`--once`).
    pub once: bool,
}

/// Drives the scheduler phases on their intervals.
///
/// Recovery runs once up front. Afterwards the scheduling cycle and the
/// completion checker each fire on their own fixed-delay interval. Phases run
/// one at a time on this task, so shutdown is only observed between phases.
pub struct Runtime<C, B> {
    scheduler: Scheduler<C, B>,
    options: RuntimeOptions,
    shutdown: watch::Receiver<bool>,
}

impl<C: Catalog, B: ExecutionBackend> fmt::Debug for Runtime<C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: Catalog, B: ExecutionBackend> Runtime<C, B> {
    pub fn new(
        scheduler: Scheduler<C, B>,
        options: RuntimeOptions,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            scheduler,
            options,
            shutdown,
        }
    }

    pub fn scheduler(&self) -> &Scheduler<C, B> {
        &self.scheduler
    }

    /// Main loop.
    ///
    /// Fails only when recovery fails; later phase errors are logged and the
    /// loop carries on.
    pub async fn run(mut self) -> Result<Scheduler<C, B>> {
        info!(
            selector = self.scheduler.selector_version(),
            once = self.options.once,
            "scheduler runtime started"
        );

        self.scheduler.recover_once().await?;

        if self.options.once {
            self.schedule().await;
            self.check().await;
            info!("single pass complete; exiting");
            return Ok(self.scheduler);
        }

        let mut submission = time::interval(self.options.submission_period);
        submission.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut checker = time::interval(self.options.checker_period);
        checker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.shutdown_requested() {
                break;
            }

            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || self.shutdown_requested() {
                        break;
                    }
                }
                _ = submission.tick() => self.schedule().await,
                _ = checker.tick() => self.check().await,
            }
        }

        info!("shutdown requested; runtime exiting");
        Ok(self.scheduler)
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn schedule(&self) {
        if let Err(err) = self.scheduler.schedule_once().await {
            error!(error = %err, "scheduling cycle failed");
        }
    }

    async fn check(&self) {
        self.scheduler.check_once().await;
    }
}
