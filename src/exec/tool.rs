// src/exec/tool.rs

//! Backup tool invocation boundary.
//!
//! The pipeline talks to a [`BackupTool`] instead of spawning processes
//! directly. This keeps the sub-operation argument contracts in one place
//! and lets tests substitute a fake implementation that never launches
//! anything.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::Level;

use crate::errors::Result;
use crate::exec::command::{CommandSpec, OutputSink, ProcessOutcome, run_command};

/// Retention tiers passed to `prune -keep <tier>:<days>`: keep everything
/// younger than a day, one snapshot per day for a week, one per week for a
/// month, one per month for roughly a year.
pub const RETENTION_TIERS: [&str; 4] = ["0:360", "30:30", "7:7", "1:1"];

/// The fixed set of sub-operations the pipeline runs against a repository
/// directory. Exit code 0 is the only success signal; all output is opaque
/// text except the snapshot listing consumed by verification.
#[async_trait]
pub trait BackupTool: Send + Sync {
    /// `backup -stats`: create a new snapshot of `repo`.
    async fn backup(&self, repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome>;

    /// `prune -keep …`: apply the tiered retention policy.
    async fn prune(&self, repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome>;

    /// `list`: enumerate snapshots. Read-only, so it runs live even in
    /// dry-run mode; verification needs the real revision numbers.
    async fn list_snapshots(&self, repo: &Path, sink: &mut dyn OutputSink)
    -> Result<ProcessOutcome>;

    /// `check -chunks -r <revision> -id <id>`: full chunk-level integrity
    /// check of one snapshot revision.
    async fn check_snapshot(
        &self,
        repo: &Path,
        snapshot_id: &str,
        revision: u32,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessOutcome>;

    /// `check`: the tool's lighter default integrity check.
    async fn check(&self, repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome>;
}

/// Real tool backend wrapping the `duplicacy` CLI.
#[derive(Debug, Clone)]
pub struct DuplicacyTool {
    command: PathBuf,
    env: BTreeMap<String, String>,
    dry_run: bool,
    timeout: Option<Duration>,
}

impl DuplicacyTool {
    pub fn new(
        command: PathBuf,
        env: BTreeMap<String, String>,
        dry_run: bool,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            command,
            env,
            dry_run,
            timeout,
        }
    }

    fn spec(&self, repo: &Path, args: &[&str]) -> CommandSpec {
        let mut full_args = Vec::with_capacity(args.len() + 1);
        // Ask the tool itself for debug output when our own logging runs at
        // debug or finer; the flag goes before the sub-operation.
        if tracing::enabled!(Level::DEBUG) {
            full_args.push("-debug".to_string());
        }
        full_args.extend(args.iter().map(|a| a.to_string()));

        CommandSpec {
            program: self.command.display().to_string(),
            args: full_args,
            cwd: repo.to_path_buf(),
            env: self.env.clone(),
        }
    }

    async fn run(
        &self,
        repo: &Path,
        args: &[&str],
        dry_run: bool,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessOutcome> {
        let spec = self.spec(repo, args);
        run_command(&spec, dry_run, self.timeout, sink).await
    }
}

#[async_trait]
impl BackupTool for DuplicacyTool {
    async fn backup(&self, repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome> {
        self.run(repo, &["backup", "-stats"], self.dry_run, sink).await
    }

    async fn prune(&self, repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome> {
        let mut args = vec!["prune"];
        for tier in RETENTION_TIERS {
            args.push("-keep");
            args.push(tier);
        }
        self.run(repo, &args, self.dry_run, sink).await
    }

    async fn list_snapshots(
        &self,
        repo: &Path,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessOutcome> {
        // Never dry-run: listing has no side effects and the verify branch
        // cannot resolve a revision from an empty dry-run outcome.
        self.run(repo, &["list"], false, sink).await
    }

    async fn check_snapshot(
        &self,
        repo: &Path,
        snapshot_id: &str,
        revision: u32,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessOutcome> {
        let revision = revision.to_string();
        let args = ["check", "-chunks", "-r", revision.as_str(), "-id", snapshot_id];
        self.run(repo, &args, self.dry_run, sink).await
    }

    async fn check(&self, repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome> {
        self.run(repo, &["check"], self.dry_run, sink).await
    }
}
