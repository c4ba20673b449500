// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod net;
pub mod notify;
pub mod pipeline;
pub mod schedule;
pub mod summary;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::exec::DuplicacyTool;
use crate::logging::FileStepLogs;
use crate::notify::{Notifier, WebhookNotifier, build_payload};
use crate::pipeline::PipelineOptions;
use crate::schedule::{FileStampStore, VerificationScheduler};
use crate::summary::RunSummary;

/// Directory the backup tool keeps its repository state in. Source
/// directories without it are skipped.
const TOOL_STATE_DIR: &str = ".duplicacy";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the connectivity gate (only when notification is configured)
/// - stamp store / scheduler / tool backend / step log sinks
/// - the per-directory pipeline loop
/// - summary rendering and notification
///
/// The returned summary's `overall_success()` drives the process exit
/// status in `main`; this function only fails on run-level problems
/// (unusable config, unreachable network before a notifying run).
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let config_path = PathBuf::from(&args.config);
    let cfg = config::load_and_validate(&config_path)
        .with_context(|| format!("loading config from {:?}", config_path))?;

    let dry_run = cfg.settings.dry_run || args.dry_run;

    if let Some(notify_cfg) = &cfg.notify {
        if !net::wait_online(&notify_cfg.probe_host).await {
            bail!("not online, refusing to start a run that cannot notify");
        }
    }

    let store = FileStampStore::load(cfg.settings.stamp_path.clone());
    let mut scheduler = VerificationScheduler::new(store);

    let tool = DuplicacyTool::new(
        cfg.settings.tool_command.clone(),
        cfg.tool_env.clone(),
        dry_run,
        cfg.settings.command_timeout_secs.map(Duration::from_secs),
    );

    let sinks = FileStepLogs::new(cfg.settings.log_path.clone(), cfg.settings.num_logfiles);

    let options = PipelineOptions {
        force_verification: args.force_verification,
        dry_run,
    };

    info!(source_root = %cfg.settings.source_root.display(), dry_run, "starting backup run");

    let mut summary = RunSummary::new();
    for dir in source_directories(&cfg.settings.source_root)? {
        let report =
            pipeline::run_directory(&tool, &mut scheduler, &sinks, &dir, options, Utc::now())
                .await;
        summary.add(report);
    }

    info!("{}", summary.render());

    notify_if_configured(&cfg, &summary, &sinks).await;

    Ok(summary)
}

/// Immediate subdirectories of `root` that hold a tool repository, in
/// sorted order so the summary layout is stable across runs.
fn source_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(root).with_context(|| format!("reading source root {:?}", root))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            info!(path = %path.display(), "skipping, not a directory");
            continue;
        }
        if !path.join(TOOL_STATE_DIR).is_dir() {
            info!(path = %path.display(), "skipping, not an initialized repository");
            continue;
        }
        dirs.push(path);
    }
    dirs.sort();
    Ok(dirs)
}

/// Deliver the run report when a notifier is configured. Delivery failures
/// are logged and swallowed; the summary alone decides the exit status.
async fn notify_if_configured(cfg: &ConfigFile, summary: &RunSummary, sinks: &FileStepLogs) {
    let Some(notify_cfg) = &cfg.notify else {
        return;
    };

    let payload = build_payload(summary, sinks);
    let notifier = WebhookNotifier::new(notify_cfg.webhook_url.clone());
    if let Err(err) = notifier.notify(&payload).await {
        warn!(error = %err, "failed to deliver run notification");
    }
}
