// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DupguardError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The tool executable could not be started at all. Distinct from a
    /// non-zero exit of a launched process.
    #[error("failed to launch '{command}': {source}")]
    LaunchError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited non-zero. Carries the captured output for
    /// caller-side diagnostics; callers only branch on success/failure.
    #[error("'{command}' exited with code {exit_code}")]
    ExecutionError {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("'{command}' did not finish within {timeout_secs}s and was killed")]
    TimeoutError { command: String, timeout_secs: u64 },

    #[error("no 'Snapshot <id> revision <n>' lines found in snapshot list output")]
    SnapshotParseError,

    #[error("stamp store error: {0}")]
    PersistenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DupguardError>;
