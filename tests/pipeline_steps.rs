// tests/pipeline_steps.rs

//! Directory pipeline semantics against a fake tool backend: step
//! ordering, branch selection and failure containment.

mod common;
use crate::common::init_tracing;

use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};

use dupguard::errors::{DupguardError, Result};
use dupguard::pipeline::{PipelineOptions, run_directory};
use dupguard::schedule::{MemoryStampStore, StampStore, VerificationScheduler};
use dupguard::summary::StepKind;
use dupguard_test_utils::fake_tool::FakeTool;
use dupguard_test_utils::sinks::TracingSinks;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 3, 0, 0).unwrap()
}

fn steps_of(report: &dupguard::summary::DirectoryReport) -> Vec<(StepKind, bool)> {
    report.steps.iter().map(|s| (s.step, s.ok)).collect()
}

#[tokio::test]
async fn backup_failure_does_not_abort_pipeline() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy().backup_ok(false);
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());
    // Fresh stamp so the light check branch is taken.
    scheduler.record_success(dir, now() - Duration::days(10)).unwrap();

    let report = run_directory(
        &tool,
        &mut scheduler,
        &TracingSinks,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;

    assert_eq!(
        steps_of(&report),
        vec![
            (StepKind::Backup, false),
            (StepKind::Prune, true),
            (StepKind::Check, true),
        ]
    );
    assert_eq!(tool.calls(), vec!["backup", "prune", "check"]);
}

#[tokio::test]
async fn due_directory_gets_full_verification_and_stamp() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy()
        .list_output(Some("Snapshot abc123 revision 5\nSnapshot abc123 revision 7"));
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());

    let report = run_directory(
        &tool,
        &mut scheduler,
        &TracingSinks,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;

    assert_eq!(
        steps_of(&report),
        vec![
            (StepKind::Backup, true),
            (StepKind::Prune, true),
            (StepKind::Verify, true),
        ]
    );
    // The chunk check targets the *last* listed revision.
    assert!(tool.calls().contains(&"check_snapshot abc123 7".to_string()));
    assert_eq!(scheduler.store().last_verified(dir), Some(now()));
}

#[tokio::test]
async fn no_snapshot_lines_fail_verification_without_stamp() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy().list_output(Some("no snapshots have been created yet"));
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());

    let report = run_directory(
        &tool,
        &mut scheduler,
        &TracingSinks,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;

    assert_eq!(
        steps_of(&report),
        vec![
            (StepKind::Backup, true),
            (StepKind::Prune, true),
            (StepKind::Verify, false),
        ]
    );
    // No chunk check is attempted and no check fallback happens.
    assert_eq!(tool.calls(), vec!["backup", "prune", "list"]);
    assert!(scheduler.store().last_verified(dir).is_none());
}

#[tokio::test]
async fn list_failure_fails_verification() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy().list_output(None);
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());

    let report = run_directory(
        &tool,
        &mut scheduler,
        &TracingSinks,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;

    assert_eq!(
        steps_of(&report).last(),
        Some(&(StepKind::Verify, false))
    );
    assert!(scheduler.store().last_verified(dir).is_none());
}

#[tokio::test]
async fn fresh_stamp_selects_light_check() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy();
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());
    scheduler.record_success(dir, now() - Duration::days(10)).unwrap();

    let report = run_directory(
        &tool,
        &mut scheduler,
        &TracingSinks,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;

    assert_eq!(
        steps_of(&report),
        vec![
            (StepKind::Backup, true),
            (StepKind::Prune, true),
            (StepKind::Check, true),
        ]
    );
    assert!(!tool.calls().contains(&"list".to_string()));
}

#[tokio::test]
async fn force_runs_verification_but_stamps_only_on_success() {
    init_tracing();
    let dir = Path::new("/data/a");
    let stamped_at = now() - Duration::days(10);

    // Forced verification that fails at the chunk check.
    let tool = FakeTool::happy().check_snapshot_ok(false);
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());
    scheduler.record_success(dir, stamped_at).unwrap();

    let options = PipelineOptions {
        force_verification: true,
        dry_run: false,
    };
    let report = run_directory(&tool, &mut scheduler, &TracingSinks, dir, options, now()).await;

    assert_eq!(steps_of(&report).last(), Some(&(StepKind::Verify, false)));
    // Force alone must not refresh the stamp.
    assert_eq!(scheduler.store().last_verified(dir), Some(stamped_at));
}

#[tokio::test]
async fn dry_run_skips_stamp_write() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy();
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());

    let options = PipelineOptions {
        force_verification: false,
        dry_run: true,
    };
    let report = run_directory(&tool, &mut scheduler, &TracingSinks, dir, options, now()).await;

    assert_eq!(steps_of(&report).last(), Some(&(StepKind::Verify, true)));
    assert!(scheduler.store().last_verified(dir).is_none());
}

#[tokio::test]
async fn check_failure_is_recorded_without_aborting() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy().check_ok(false);
    let mut scheduler = VerificationScheduler::new(MemoryStampStore::new());
    scheduler.record_success(dir, now() - Duration::days(10)).unwrap();

    let report = run_directory(
        &tool,
        &mut scheduler,
        &TracingSinks,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;

    assert_eq!(steps_of(&report).last(), Some(&(StepKind::Check, false)));
}

/// Stamp store whose writes always fail.
struct FailingStore;

impl StampStore for FailingStore {
    fn last_verified(&self, _dir: &Path) -> Option<DateTime<Utc>> {
        None
    }

    fn record(&mut self, _dir: &Path, _at: DateTime<Utc>) -> Result<()> {
        Err(DupguardError::PersistenceError("disk full".to_string()))
    }
}

#[tokio::test]
async fn stamp_write_failure_fails_the_verify_step_only() {
    init_tracing();
    let dir = Path::new("/data/a");
    let tool = FakeTool::happy();
    let mut scheduler = VerificationScheduler::new(FailingStore);

    let report = run_directory(
        &tool,
        &mut scheduler,
        &TracingSinks,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;

    assert_eq!(
        steps_of(&report),
        vec![
            (StepKind::Backup, true),
            (StepKind::Prune, true),
            (StepKind::Verify, false),
        ]
    );
}
