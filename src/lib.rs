// src/lib.rs

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod selector;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::catalog::JsonFileCatalog;
use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeOptions, Scheduler, SchedulerOptions};
use crate::exec::ArrebolBackend;
use crate::pipeline::Phase;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the JSON catalog and the Arrebol backend
/// - the scheduler and its runtime
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let catalog = JsonFileCatalog::open(&cfg.catalog.path)?;
    let backend = ArrebolBackend::new(&cfg.arrebol, &cfg.scheduler.queue_id)?;
    let scheduler = Scheduler::new(catalog, backend, SchedulerOptions::from_config(&cfg));

    // Ctrl-C → graceful shutdown between phases.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received; finishing current phase");
        let _ = shutdown_tx.send(true);
    });

    let options = RuntimeOptions {
        submission_period: Duration::from_secs(cfg.scheduler.submission_period_secs),
        checker_period: Duration::from_secs(cfg.scheduler.checker_period_secs),
        once: args.once,
    };

    Runtime::new(scheduler, options, shutdown_rx).run().await?;
    Ok(())
}

/// Simple dry-run output: print the effective settings and script tags.
fn print_dry_run(cfg: &ConfigFile) {
    println!("saps-scheduler dry-run");
    println!("  scheduler.queue_id = {}", cfg.scheduler.queue_id);
    println!("  scheduler.max_waiting_jobs = {}", cfg.scheduler.max_waiting_jobs);
    println!(
        "  scheduler.submission_period_secs = {}",
        cfg.scheduler.submission_period_secs
    );
    println!(
        "  scheduler.checker_period_secs = {}",
        cfg.scheduler.checker_period_secs
    );
    println!("  scheduler.work_root = {}", cfg.scheduler.work_root);
    println!("  arrebol.base_url = {}", cfg.arrebol.base_url);
    println!("  arrebol.retry_delay_secs = {}", cfg.arrebol.retry_delay_secs);
    println!("  catalog.path = {}", cfg.catalog.path.display());
    println!();

    for phase in [Phase::InputDownloading, Phase::Preprocessing, Phase::Processing] {
        let tags = cfg.tags.for_phase(phase);
        println!("tags.{} ({}):", phase.as_str(), tags.len());
        for tag in tags {
            println!("  - {}", tag.name);
            println!("      image: {}:{}", tag.docker_repository, tag.docker_tag);
            println!("      cpu: {}  memory: {}", tag.cpu_usage, tag.memory_usage);
        }
    }

    debug!("dry-run complete (backend not contacted)");
}
