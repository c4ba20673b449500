// tests/summary_report.rs

//! Run summary aggregation and rendering.

mod common;
use crate::common::init_tracing;

use std::path::Path;

use dupguard::summary::{DirectoryReport, RunSummary, StepKind};

fn report(dir: &str, steps: &[(StepKind, bool)]) -> DirectoryReport {
    let mut r = DirectoryReport::new(Path::new(dir));
    for (step, ok) in steps {
        r.push(*step, *ok);
    }
    r
}

#[test]
fn empty_summary_is_vacuously_successful() {
    init_tracing();
    assert!(RunSummary::new().overall_success());
}

#[test]
fn single_failed_step_flips_overall_success() {
    init_tracing();
    let mut summary = RunSummary::new();
    summary.add(report(
        "/data/a",
        &[(StepKind::Backup, true), (StepKind::Prune, true), (StepKind::Check, true)],
    ));
    assert!(summary.overall_success());

    summary.add(report(
        "/data/b",
        &[(StepKind::Backup, true), (StepKind::Prune, false), (StepKind::Check, true)],
    ));
    assert!(!summary.overall_success());
}

#[test]
fn render_layout_is_stable() {
    init_tracing();
    let mut summary = RunSummary::new();
    summary.add(report(
        "/data/a",
        &[
            (StepKind::Backup, true),
            (StepKind::Prune, false),
            (StepKind::Verify, true),
        ],
    ));
    summary.add(report(
        "/data/b",
        &[
            (StepKind::Backup, true),
            (StepKind::Prune, true),
            (StepKind::Check, true),
        ],
    ));

    let expected = "\
Summary:
  /data/a:
    backup: OK
    prune : FAILED
    verify: OK
  /data/b:
    backup: OK
    prune : OK
    check : OK

See individual logfiles for more info";

    assert_eq!(summary.render(), expected);
}

#[test]
fn render_preserves_insertion_order() {
    init_tracing();
    let mut summary = RunSummary::new();
    summary.add(report("/data/z", &[(StepKind::Backup, true)]));
    summary.add(report("/data/a", &[(StepKind::Backup, true)]));

    let rendered = summary.render();
    let z_pos = rendered.find("/data/z").unwrap();
    let a_pos = rendered.find("/data/a").unwrap();
    assert!(z_pos < a_pos, "directories must render in execution order");
}
