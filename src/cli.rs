// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dupguard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dupguard",
    version,
    about = "Run scheduled backups, prune old snapshots and verify archives.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Dupguard.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Dupguard.toml")]
    pub config: String,

    /// Run the full verification for every directory, regardless of when
    /// it was last verified.
    #[arg(long)]
    pub force_verification: bool,

    /// Log commands instead of executing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DUPGUARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
