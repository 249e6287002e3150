// tests/config_errors.rs

use std::error::Error;
use std::fs;

use tempfile::tempdir;

use saps_scheduler::config::load_and_validate;
use saps_scheduler::errors::SchedulerError;
use saps_scheduler::pipeline::Phase;

type TestResult = Result<(), Box<dyn Error>>;

const FULL: &str = r#"
[scheduler]
queue_id = "saps"
max_waiting_jobs = 8
submission_period_secs = 10
checker_period_secs = 15
work_root = "/export/saps"

[arrebol]
base_url = "https://arrebol.example.org"
retry_delay_secs = 3

[catalog]
path = "/var/lib/saps/tasks.json"

[[tags.inputdownloading]]
name = "googleapis"
docker_repository = "fogbow/inputdownloader"
docker_tag = "googleapis"
memory_usage = "1Gi"
cpu_usage = "1"

[[tags.processing]]
name = "ufcg-sebal"
docker_repository = "fogbow/worker"
docker_tag = "ufcg-sebal"
memory_usage = "4Gi"
cpu_usage = "2"
"#;

#[test]
fn loads_full_config() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Scheduler.toml");
    fs::write(&path, FULL)?;

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.scheduler.queue_id, "saps");
    assert_eq!(cfg.scheduler.max_waiting_jobs, 8);
    assert_eq!(cfg.scheduler.checker_period_secs, 15);
    assert_eq!(cfg.arrebol.retry_delay_secs, 3);
    assert_eq!(cfg.arrebol.request_timeout_secs, 30);
    let tag = cfg.tags.find(Phase::Processing, "ufcg-sebal").ok_or("tag missing")?;
    assert_eq!(tag.docker_repository, "fogbow/worker");
    assert!(cfg.tags.for_phase(Phase::Preprocessing).is_empty());
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let err = load_and_validate("/definitely/not/here/Scheduler.toml").unwrap_err();
    assert!(matches!(err, SchedulerError::IoError(_)));
}

#[test]
fn malformed_toml_is_toml_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Scheduler.toml");
    fs::write(&path, "[scheduler\nqueue_id = ")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SchedulerError::TomlError(_)));
    Ok(())
}

#[test]
fn zero_period_is_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Scheduler.toml");
    fs::write(&path, "[scheduler]\nchecker_period_secs = 0\n")?;

    let err = load_and_validate(&path).unwrap_err();
    match err {
        SchedulerError::ConfigError(msg) => assert!(msg.contains("checker_period_secs")),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn zero_retry_delay_is_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Scheduler.toml");
    fs::write(&path, "[arrebol]\nretry_delay_secs = 0\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SchedulerError::ConfigError(_)));
    Ok(())
}
