// tests/completion_checker.rs

mod common;

use common::{TestResult, TestScheduler, scheduler, stored};

use saps_scheduler::catalog::InMemoryCatalog;
use saps_scheduler::pipeline::Stage;
use saps_scheduler_test_utils::{FakeBackend, TaskBuilder, finished_job, init_tracing, job_in_state};

/// Catalog with one task in `stage` tracked under job `j1`.
fn tracked(stage: Stage) -> (InMemoryCatalog, FakeBackend, TestScheduler) {
    let task = TaskBuilder::new("t1").stage(stage).job_id("j1").build();
    let catalog = InMemoryCatalog::with_tasks(vec![task.clone()]);
    let backend = FakeBackend::new();
    let scheduler = scheduler(&catalog, &backend, 5);
    scheduler.registry().add("j1", task);
    (catalog, backend, scheduler)
}

#[tokio::test]
async fn successful_processing_job_finishes_task() -> TestResult {
    init_tracing();

    let (catalog, backend, scheduler) = tracked(Stage::Running);
    backend.put_job(finished_job("j1", "running-t1", &[0, 0, 0]));

    let report = scheduler.check_once().await;

    assert_eq!(report.succeeded, 1);
    let task = stored(&catalog, "t1");
    assert_eq!(task.stage, Stage::Finished);
    assert_eq!(task.execution_job_id, None);
    assert_eq!(task.error, None);
    assert!(scheduler.registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn successful_jobs_advance_one_stage() -> TestResult {
    init_tracing();

    for (from, to) in [
        (Stage::Downloading, Stage::Downloaded),
        (Stage::Preprocessing, Stage::Ready),
    ] {
        let (catalog, backend, scheduler) = tracked(from);
        backend.put_job(finished_job("j1", "job", &[0]));

        scheduler.check_once().await;

        assert_eq!(stored(&catalog, "t1").stage, to, "after a {from} job");
    }
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_code_fails_task() -> TestResult {
    init_tracing();

    let (catalog, backend, scheduler) = tracked(Stage::Running);
    backend.put_job(finished_job("j1", "running-t1", &[0, 3]));

    let report = scheduler.check_once().await;

    assert_eq!(report.failed, 1);
    let task = stored(&catalog, "t1");
    assert_eq!(task.stage, Stage::Failed);
    assert_eq!(task.error.as_deref(), Some("error while execute running phase"));
    assert_eq!(task.execution_job_id, None);
    assert!(!scheduler.registry().contains("j1"));
    Ok(())
}

#[tokio::test]
async fn unfinished_job_stays_tracked() -> TestResult {
    init_tracing();

    let (catalog, backend, scheduler) = tracked(Stage::Running);
    backend.put_job(job_in_state("j1", "running-t1", "RUNNING"));

    let report = scheduler.check_once().await;

    assert_eq!(report.pending, 1);
    assert!(scheduler.registry().contains("j1"));
    let task = stored(&catalog, "t1");
    assert_eq!(task.stage, Stage::Running);
    assert_eq!(task.execution_job_id.as_deref(), Some("j1"));
    Ok(())
}

#[tokio::test]
async fn lost_job_rolls_task_back() -> TestResult {
    init_tracing();

    let (catalog, _backend, scheduler) = tracked(Stage::Running);

    let report = scheduler.check_once().await;

    assert_eq!(report.lost, 1);
    let task = stored(&catalog, "t1");
    assert_eq!(task.stage, Stage::Ready);
    assert_eq!(task.execution_job_id, None);
    assert!(scheduler.registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn terminal_state_match_is_case_insensitive() -> TestResult {
    init_tracing();

    let (catalog, backend, scheduler) = tracked(Stage::Running);
    let mut job = finished_job("j1", "running-t1", &[0]);
    job.state = "finished".to_string();
    job.tasks[0].commands[0].state = "Finished".to_string();
    backend.put_job(job);

    scheduler.check_once().await;

    assert_eq!(stored(&catalog, "t1").stage, Stage::Finished);
    Ok(())
}

#[tokio::test]
async fn task_walks_the_pipeline_across_cycles() -> TestResult {
    init_tracing();

    let catalog = InMemoryCatalog::with_tasks(vec![TaskBuilder::new("t1").build()]);
    let backend = FakeBackend::new();
    let scheduler = scheduler(&catalog, &backend, 5);

    let expected = [
        (Stage::Downloading, Stage::Downloaded),
        (Stage::Preprocessing, Stage::Ready),
        (Stage::Running, Stage::Finished),
    ];

    for (submitted_as, completed_as) in expected {
        scheduler.schedule_once().await?;
        let task = stored(&catalog, "t1");
        assert_eq!(task.stage, submitted_as);

        let job_id = task.execution_job_id.clone().expect("job id after submission");
        backend.put_job(finished_job(&job_id, &task.job_name(), &[0]));

        scheduler.check_once().await;
        assert_eq!(stored(&catalog, "t1").stage, completed_as);
    }

    assert_eq!(
        backend.submitted_labels(),
        vec!["downloading-t1", "preprocessing-t1", "running-t1"]
    );
    assert!(scheduler.registry().is_empty());

    // finished tasks are never selected again
    let report = scheduler.schedule_once().await?;
    assert_eq!(report.selected, 0);
    Ok(())
}
