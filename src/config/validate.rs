// src/config/validate.rs

use std::collections::BTreeSet;

use crate::config::model::{ConfigFile, RawConfigFile, TagsSection};
use crate::errors::{Result, SchedulerError};
use crate::pipeline::Phase;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SchedulerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_arrebol(cfg)?;
    validate_tags(&cfg.tags)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SchedulerError {
    SchedulerError::ConfigError(msg.into())
}

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    let s = &cfg.scheduler;

    if s.max_waiting_jobs == 0 {
        return Err(config_error("[scheduler].max_waiting_jobs must be >= 1 (got 0)"));
    }
    if s.submission_period_secs == 0 {
        return Err(config_error(
            "[scheduler].submission_period_secs must be >= 1 (got 0)",
        ));
    }
    if s.checker_period_secs == 0 {
        return Err(config_error("[scheduler].checker_period_secs must be >= 1 (got 0)"));
    }
    if s.queue_id.trim().is_empty() {
        return Err(config_error("[scheduler].queue_id must not be empty"));
    }
    Ok(())
}

fn validate_arrebol(cfg: &RawConfigFile) -> Result<()> {
    let a = &cfg.arrebol;

    let url = a.base_url.trim();
    if url.is_empty() {
        return Err(config_error("[arrebol].base_url must not be empty"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(config_error(format!(
            "[arrebol].base_url must be an http(s) URL (got '{url}')"
        )));
    }
    if a.retry_delay_secs == 0 {
        return Err(config_error("[arrebol].retry_delay_secs must be >= 1 (got 0)"));
    }
    if a.request_timeout_secs == 0 {
        return Err(config_error("[arrebol].request_timeout_secs must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_tags(tags: &TagsSection) -> Result<()> {
    for phase in [Phase::InputDownloading, Phase::Preprocessing, Phase::Processing] {
        let mut seen = BTreeSet::new();
        for tag in tags.for_phase(phase) {
            if tag.name.trim().is_empty() {
                return Err(config_error(format!(
                    "[[tags.{}]] entry has an empty name",
                    phase.as_str()
                )));
            }
            if !seen.insert(tag.name.as_str()) {
                return Err(config_error(format!(
                    "duplicate script tag '{}' in [[tags.{}]]",
                    tag.name,
                    phase.as_str()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.scheduler.queue_id, "default");
        assert_eq!(cfg.scheduler.max_waiting_jobs, 20);
        assert_eq!(cfg.scheduler.submission_period_secs, 5);
        assert_eq!(cfg.arrebol.retry_delay_secs, 5);
        assert_eq!(cfg.catalog.path.to_str(), Some("tasks.json"));
        assert!(cfg.tags.processing.is_empty());
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = parse("[scheduler]\nmax_waiting_jobs = 0\n").unwrap_err();
        assert!(matches!(err, SchedulerError::ConfigError(msg) if msg.contains("max_waiting_jobs")));
    }

    #[test]
    fn non_http_url_rejected() {
        let err = parse("[arrebol]\nbase_url = \"ftp://host\"\n").unwrap_err();
        assert!(matches!(err, SchedulerError::ConfigError(msg) if msg.contains("base_url")));
    }

    #[test]
    fn duplicate_tag_rejected() {
        let src = r#"
[[tags.processing]]
name = "sebal"
docker_repository = "a"
docker_tag = "a"
memory_usage = "1Gi"
cpu_usage = "1"

[[tags.processing]]
name = "sebal"
docker_repository = "b"
docker_tag = "b"
memory_usage = "1Gi"
cpu_usage = "1"
"#;
        let err = parse(src).unwrap_err();
        assert!(matches!(err, SchedulerError::ConfigError(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn legacy_input_table_name_accepted() {
        let src = r#"
[[tags.inputdownloader]]
name = "googleapis"
docker_repository = "fogbow/inputdownloader"
docker_tag = "googleapis"
memory_usage = "1Gi"
cpu_usage = "1"
"#;
        let cfg = parse(src).unwrap();
        assert!(cfg.tags.find(Phase::InputDownloading, "googleapis").is_some());
        assert!(cfg.tags.find(Phase::Processing, "googleapis").is_none());
    }
}
