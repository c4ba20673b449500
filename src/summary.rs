// src/summary.rs

//! Per-step outcomes and the consolidated run report.
//!
//! Pure data; no IO. The rendered layout is consumed by notifiers and
//! humans, never parsed back.

use std::fmt;
use std::path::{Path, PathBuf};

/// The named steps a directory pipeline can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Backup,
    Prune,
    Verify,
    Check,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Backup => "backup",
            StepKind::Prune => "prune",
            StepKind::Verify => "verify",
            StepKind::Check => "check",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step's boolean outcome for one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub step: StepKind,
    pub ok: bool,
}

impl StepResult {
    pub fn new(step: StepKind, ok: bool) -> Self {
        Self { step, ok }
    }
}

/// The ordered step outcomes of one directory's pipeline run.
#[derive(Debug, Clone)]
pub struct DirectoryReport {
    pub dir: PathBuf,
    pub steps: Vec<StepResult>,
}

impl DirectoryReport {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: StepKind, ok: bool) {
        self.steps.push(StepResult::new(step, ok));
    }

    pub fn all_ok(&self) -> bool {
        self.steps.iter().all(|s| s.ok)
    }
}

/// Accumulates directory reports in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    reports: Vec<DirectoryReport>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, report: DirectoryReport) {
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[DirectoryReport] {
        &self.reports
    }

    /// True iff every recorded step result is true. A run with zero
    /// directories is vacuously successful. Deterministic: depends only on
    /// the recorded booleans, never on log content or timing.
    pub fn overall_success(&self) -> bool {
        self.reports.iter().all(|r| r.all_ok())
    }

    /// Stable human-readable report, directory-then-step ordered.
    pub fn render(&self) -> String {
        let mut out = String::from("Summary:");
        for report in &self.reports {
            out.push_str(&format!("\n  {}:", report.dir.display()));
            for step in &report.steps {
                out.push_str(&format!(
                    "\n    {:<6}: {}",
                    step.step.as_str(),
                    if step.ok { "OK" } else { "FAILED" }
                ));
            }
        }
        out.push('\n');
        out.push_str("\nSee individual logfiles for more info");
        out
    }
}
