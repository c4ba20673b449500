// tests/end_to_end_run.rs

//! Whole-pipeline scenarios with real stamp and log files on disk.

mod common;
use crate::common::init_tracing;

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};

use dupguard::logging::FileStepLogs;
use dupguard::notify::build_payload;
use dupguard::pipeline::{PipelineOptions, run_directory};
use dupguard::schedule::{FileStampStore, StampStore, VerificationScheduler};
use dupguard::summary::{RunSummary, StepKind};
use dupguard_test_utils::fake_tool::FakeTool;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 3, 0, 0).unwrap()
}

#[tokio::test]
async fn first_run_verifies_and_persists_a_stamp() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let stamp_path = tmp.path().join("stamps.json");
    let logs = FileStepLogs::new(tmp.path().join("logs"), 5);
    let dir = Path::new("/data/a");

    let tool = FakeTool::happy()
        .list_output(Some("Snapshot abc123 revision 5\nSnapshot abc123 revision 7"));
    let mut scheduler = VerificationScheduler::new(FileStampStore::load(stamp_path.clone()));

    let mut summary = RunSummary::new();
    let report = run_directory(
        &tool,
        &mut scheduler,
        &logs,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;
    summary.add(report);

    // Steps: backup, prune, then the full verification of revision 7.
    let steps: Vec<_> = summary.reports()[0]
        .steps
        .iter()
        .map(|s| (s.step, s.ok))
        .collect();
    assert_eq!(
        steps,
        vec![
            (StepKind::Backup, true),
            (StepKind::Prune, true),
            (StepKind::Verify, true),
        ]
    );
    assert!(tool.calls().contains(&"check_snapshot abc123 7".to_string()));
    assert!(summary.overall_success());

    // The stamp hit the disk before the run moved on.
    let reloaded = FileStampStore::load(stamp_path);
    assert_eq!(reloaded.last_verified(dir), Some(now()));

    // Every executed step left a log artifact behind.
    for step in [StepKind::Backup, StepKind::Prune, StepKind::Verify] {
        assert!(
            logs.latest_log(dir, step).is_some(),
            "missing log for {step:?}"
        );
    }

    // And the notification payload reflects all of it.
    let payload = build_payload(&summary, &logs);
    assert_eq!(payload.subject, "dupguard: SUCCESS");
    assert!(payload.body.contains("verify: OK"));
    assert_eq!(payload.logs.len(), 3);
    assert!(payload.logs.iter().all(|l| l.name.starts_with("a_")));
}

#[tokio::test]
async fn unparsable_listing_fails_the_run_without_a_stamp() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let stamp_path = tmp.path().join("stamps.json");
    let logs = FileStepLogs::new(tmp.path().join("logs"), 5);
    let dir = Path::new("/data/a");

    let tool = FakeTool::happy().list_output(Some("storage is empty"));
    let mut scheduler = VerificationScheduler::new(FileStampStore::load(stamp_path.clone()));

    let mut summary = RunSummary::new();
    let report = run_directory(
        &tool,
        &mut scheduler,
        &logs,
        dir,
        PipelineOptions::default(),
        now(),
    )
    .await;
    summary.add(report);

    assert!(!summary.overall_success());
    assert!(summary.render().contains("verify: FAILED"));

    // No stamp was written and no stamp file appeared.
    assert!(!stamp_path.exists());

    let payload = build_payload(&summary, &logs);
    assert_eq!(payload.subject, "dupguard: ERROR");
}

#[tokio::test]
async fn failures_in_one_directory_do_not_leak_into_another() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let stamp_path = tmp.path().join("stamps.json");
    let logs = FileStepLogs::new(tmp.path().join("logs"), 5);

    let broken_tool = FakeTool::happy().backup_ok(false).list_output(None);
    let healthy_tool = FakeTool::happy();
    let mut scheduler = VerificationScheduler::new(FileStampStore::load(stamp_path));

    let mut summary = RunSummary::new();
    summary.add(
        run_directory(
            &broken_tool,
            &mut scheduler,
            &logs,
            Path::new("/data/broken"),
            PipelineOptions::default(),
            now(),
        )
        .await,
    );
    summary.add(
        run_directory(
            &healthy_tool,
            &mut scheduler,
            &logs,
            Path::new("/data/healthy"),
            PipelineOptions::default(),
            now(),
        )
        .await,
    );

    // The first directory's failures are contained; the second one still
    // ran its full pipeline successfully.
    assert!(!summary.overall_success());
    assert!(summary.reports()[1].all_ok());
    assert_eq!(summary.reports().len(), 2);
}
