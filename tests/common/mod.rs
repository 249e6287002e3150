#![allow(dead_code)]

use std::error::Error;

use saps_scheduler::catalog::InMemoryCatalog;
use saps_scheduler::engine::Scheduler;
use saps_scheduler_test_utils::{ConfigBuilder, FakeBackend};

pub type TestResult = Result<(), Box<dyn Error>>;

pub type TestScheduler = Scheduler<InMemoryCatalog, FakeBackend>;

/// Scheduler sharing state with the given catalog and backend handles.
pub fn scheduler(
    catalog: &InMemoryCatalog,
    backend: &FakeBackend,
    max_waiting_jobs: usize,
) -> TestScheduler {
    let options = ConfigBuilder::new()
        .max_waiting_jobs(max_waiting_jobs)
        .retry_delay_secs(1)
        .options();
    Scheduler::new(catalog.clone(), backend.clone(), options)
}

/// Stored copy of task `id`; panics if it is missing.
pub fn stored(catalog: &InMemoryCatalog, id: &str) -> saps_scheduler::pipeline::Task {
    catalog
        .get(id)
        .unwrap_or_else(|| panic!("task {id} missing from catalog"))
}
