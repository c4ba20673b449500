// src/notify/mod.rs

//! Notification boundary.
//!
//! The core hands a finished [`RunSummary`] plus the latest log artifact
//! per executed step to a [`Notifier`]; how it is delivered (and any
//! retry behaviour) lives behind the trait.

pub mod webhook;

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use crate::logging::FileStepLogs;
use crate::summary::RunSummary;

pub use webhook::WebhookNotifier;

/// One step's most recent log, bundled for delivery.
#[derive(Debug, Clone)]
pub struct LogAttachment {
    /// `<dir_name>_<file_name>`, unique across directories.
    pub name: String,
    pub contents: String,
}

/// What gets delivered after a run.
#[derive(Debug, Clone)]
pub struct NotifyPayload {
    pub subject: String,
    pub body: String,
    pub logs: Vec<LogAttachment>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, payload: &NotifyPayload) -> anyhow::Result<()>;
}

/// Assemble the payload for a finished run: subject line, rendered
/// summary, and the newest log file of every step that was executed.
///
/// Unreadable log files are skipped with a warning; notification must not
/// fail the run over a log artifact.
pub fn build_payload(summary: &RunSummary, logs: &FileStepLogs) -> NotifyPayload {
    let subject = format!(
        "dupguard: {}",
        if summary.overall_success() { "SUCCESS" } else { "ERROR" }
    );

    let mut attachments = Vec::new();
    for report in summary.reports() {
        for step in &report.steps {
            let Some(path) = logs.latest_log(&report.dir, step.step) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(contents) => attachments.push(LogAttachment {
                    name: attachment_name(&report.dir, &path),
                    contents,
                }),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable log attachment");
                }
            }
        }
    }

    NotifyPayload {
        subject,
        body: summary.render(),
        logs: attachments,
    }
}

fn attachment_name(dir: &Path, log_path: &Path) -> String {
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let file_name = log_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{dir_name}_{file_name}")
}
