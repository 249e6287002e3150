// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `saps-scheduler`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "saps-scheduler",
    version,
    about = "Schedule satellite-image processing tasks on an Arrebol execution backend.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Scheduler.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Scheduler.toml")]
    pub config: String,

    /// Run recovery, one scheduling cycle and one completion check, then exit.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SAPS_SCHEDULER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config, print a summary, but don't contact the backend.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
