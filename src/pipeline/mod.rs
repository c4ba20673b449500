// src/pipeline/mod.rs

//! The per-directory step pipeline: backup, prune, then either a full
//! verification or a light check.
//!
//! Failure containment is the core contract here: every step failure is
//! caught at the step boundary, logged, and recorded as a `false` step
//! result. One broken step never suppresses the remaining steps, and one
//! broken directory never terminates processing of the others. Backup and
//! prune operate on previously-existing snapshots independently of each
//! other, so a failed backup still gets its retention pruning and its
//! periodic integrity check.

pub mod snapshots;

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::errors::{DupguardError, Result};
use crate::exec::command::{OutputSink, ProcessOutcome, TracingSink};
use crate::exec::tool::BackupTool;
use crate::logging::StepSinkFactory;
use crate::schedule::{StampStore, VerificationScheduler};
use crate::summary::{DirectoryReport, StepKind};

/// Behaviour switches threaded in from the CLI and config.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Run the full verification regardless of stamp age. Never causes a
    /// stamp write on its own; only a successful verification does.
    pub force_verification: bool,
    /// Commands are logged instead of executed, and no stamp is written.
    pub dry_run: bool,
}

/// Run the whole step pipeline for one directory.
///
/// Always completes and returns a report covering every attempted step:
/// `backup` and `prune` unconditionally, then exactly one of `verify` or
/// `check` depending on `force || is_due`.
pub async fn run_directory<S, T>(
    tool: &T,
    scheduler: &mut VerificationScheduler<S>,
    sinks: &dyn StepSinkFactory,
    dir: &Path,
    options: PipelineOptions,
    now: DateTime<Utc>,
) -> DirectoryReport
where
    S: StampStore,
    T: BackupTool + ?Sized,
{
    let mut report = DirectoryReport::new(dir);

    report.push(StepKind::Backup, backup_step(tool, sinks, dir).await);
    report.push(StepKind::Prune, prune_step(tool, sinks, dir).await);

    if options.force_verification || scheduler.is_due(dir, now) {
        let ok = verify_step(tool, scheduler, sinks, dir, options.dry_run, now).await;
        report.push(StepKind::Verify, ok);
    } else {
        report.push(StepKind::Check, check_step(tool, sinks, dir).await);
    }

    report
}

async fn backup_step<T: BackupTool + ?Sized>(
    tool: &T,
    sinks: &dyn StepSinkFactory,
    dir: &Path,
) -> bool {
    info!(dir = %dir.display(), "starting backup");
    let mut sink = open_sink(sinks, dir, StepKind::Backup);
    step_outcome(StepKind::Backup, dir, tool.backup(dir, sink.as_mut()).await)
}

async fn prune_step<T: BackupTool + ?Sized>(
    tool: &T,
    sinks: &dyn StepSinkFactory,
    dir: &Path,
) -> bool {
    info!(dir = %dir.display(), "starting prune");
    let mut sink = open_sink(sinks, dir, StepKind::Prune);
    step_outcome(StepKind::Prune, dir, tool.prune(dir, sink.as_mut()).await)
}

async fn check_step<T: BackupTool + ?Sized>(
    tool: &T,
    sinks: &dyn StepSinkFactory,
    dir: &Path,
) -> bool {
    info!(dir = %dir.display(), "starting check");
    let mut sink = open_sink(sinks, dir, StepKind::Check);
    step_outcome(StepKind::Check, dir, tool.check(dir, sink.as_mut()).await)
}

async fn verify_step<S, T>(
    tool: &T,
    scheduler: &mut VerificationScheduler<S>,
    sinks: &dyn StepSinkFactory,
    dir: &Path,
    dry_run: bool,
    now: DateTime<Utc>,
) -> bool
where
    S: StampStore,
    T: BackupTool + ?Sized,
{
    info!(dir = %dir.display(), "starting verification");
    // One sink spans the whole verification, list and chunk check included.
    let mut sink = open_sink(sinks, dir, StepKind::Verify);
    match verify_inner(tool, scheduler, dir, dry_run, now, sink.as_mut()).await {
        Ok(()) => true,
        Err(err) => {
            error!(dir = %dir.display(), error = %err, "verification failed");
            false
        }
    }
}

/// Resolve the latest snapshot revision from `list` output, run the full
/// chunk check against it, and record the verification stamp.
///
/// No matching snapshot line fails the verification outright; there is no
/// fallback to the light check.
async fn verify_inner<S, T>(
    tool: &T,
    scheduler: &mut VerificationScheduler<S>,
    dir: &Path,
    dry_run: bool,
    now: DateTime<Utc>,
    sink: &mut dyn OutputSink,
) -> Result<()>
where
    S: StampStore,
    T: BackupTool + ?Sized,
{
    let listing = tool.list_snapshots(dir, sink).await?;
    let latest = snapshots::latest(&listing.stdout).ok_or(DupguardError::SnapshotParseError)?;

    info!(
        dir = %dir.display(),
        snapshot = %latest.id,
        revision = latest.revision,
        "verifying latest snapshot"
    );
    tool.check_snapshot(dir, &latest.id, latest.revision, sink).await?;

    if dry_run {
        debug!(dir = %dir.display(), "skipping verification stamp (dry-run)");
    } else {
        scheduler.record_success(dir, now)?;
    }
    Ok(())
}

/// Convert a step's outcome into its boolean result, logging failures.
fn step_outcome(step: StepKind, dir: &Path, res: Result<ProcessOutcome>) -> bool {
    match res {
        Ok(_) => true,
        Err(err) => {
            error!(dir = %dir.display(), step = %step, error = %err, "step failed");
            false
        }
    }
}

/// Open the step's log sink, degrading to tracing-only output when the
/// file cannot be created. A log-file problem must not skip backup work.
fn open_sink(sinks: &dyn StepSinkFactory, dir: &Path, step: StepKind) -> Box<dyn OutputSink> {
    match sinks.open_step(dir, step) {
        Ok(sink) => sink,
        Err(err) => {
            warn!(dir = %dir.display(), step = %step, error = %err, "step log unavailable, logging to console only");
            Box::new(TracingSink)
        }
    }
}
