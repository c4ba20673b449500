// src/logging.rs

//! Logging setup for `dupguard` using `tracing` + `tracing-subscriber`,
//! plus the per-step file log sinks.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `DUPGUARD_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, warn};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;
use crate::exec::command::{OutputSink, OutputStream};
use crate::summary::StepKind;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("DUPGUARD_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Hands out one [`OutputSink`] per (directory, step) invocation.
///
/// The pipeline acquires a sink at each step boundary and passes it into
/// the process supervisor; global logger state is never mutated per step.
pub trait StepSinkFactory: Send + Sync {
    fn open_step(&self, dir: &Path, step: StepKind) -> Result<Box<dyn OutputSink>>;
}

/// File-backed step logs under `<root>/<dir_name>/<step>_<timestamp>.log`.
///
/// At most `keep` log files are retained per (directory, step); older ones
/// are purged when a new one is opened.
#[derive(Debug, Clone)]
pub struct FileStepLogs {
    root: PathBuf,
    keep: usize,
}

impl FileStepLogs {
    pub fn new(root: PathBuf, keep: usize) -> Self {
        Self { root, keep }
    }

    fn step_dir(&self, dir: &Path) -> PathBuf {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        self.root.join(name)
    }

    /// All log files for `step` under `dir`'s log directory, newest first.
    ///
    /// The timestamp in the file name sorts lexicographically, so name
    /// order is creation order.
    fn step_logs(&self, dir: &Path, step: StepKind) -> Vec<PathBuf> {
        let prefix = format!("{}_", step.as_str());
        let mut logs: Vec<PathBuf> = match fs::read_dir(self.step_dir(dir)) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".log"))
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        logs.sort();
        logs.reverse();
        logs
    }

    /// The most recent log file for (dir, step), if any exists.
    pub fn latest_log(&self, dir: &Path, step: StepKind) -> Option<PathBuf> {
        self.step_logs(dir, step).into_iter().next()
    }

    fn purge_old_logs(&self, dir: &Path, step: StepKind) {
        // Keep `keep - 1` previous logs so the file about to be created
        // brings the total back to `keep`.
        let cutoff = self.keep.saturating_sub(1);
        for stale in self.step_logs(dir, step).into_iter().skip(cutoff) {
            debug!(path = %stale.display(), "purging old logfile");
            if let Err(err) = fs::remove_file(&stale) {
                warn!(path = %stale.display(), error = %err, "failed to purge old logfile");
            }
        }
    }
}

impl StepSinkFactory for FileStepLogs {
    fn open_step(&self, dir: &Path, step: StepKind) -> Result<Box<dyn OutputSink>> {
        let step_dir = self.step_dir(dir);
        fs::create_dir_all(&step_dir)
            .with_context(|| format!("creating log directory {:?}", step_dir))?;

        self.purge_old_logs(dir, step);

        let name = format!(
            "{}_{}.log",
            step.as_str(),
            Utc::now().format("%Y%m%dT%H%M%S%6f")
        );
        let path = step_dir.join(name);
        let file =
            File::create(&path).with_context(|| format!("creating step log {:?}", path))?;

        debug!(path = %path.display(), "opened step log");
        Ok(Box::new(StepLogSink {
            writer: BufWriter::new(file),
            path,
            write_failed: false,
        }))
    }
}

/// Buffered file sink for one step invocation. Flushes on drop so every
/// exit path, including failures, leaves a complete log behind.
pub struct StepLogSink {
    writer: BufWriter<File>,
    path: PathBuf,
    write_failed: bool,
}

impl OutputSink for StepLogSink {
    fn line(&mut self, stream: OutputStream, line: &str) {
        debug!(stream = stream.as_str(), "{}", line);
        if self.write_failed {
            return;
        }
        if let Err(err) = writeln!(self.writer, "{}: {}", stream.as_str(), line) {
            warn!(path = %self.path.display(), error = %err, "step log write failed, disabling sink");
            self.write_failed = true;
        }
    }
}

impl Drop for StepLogSink {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            warn!(path = %self.path.display(), error = %err, "failed to flush step log");
        }
    }
}
