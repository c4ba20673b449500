// src/pipeline/snapshots.rs

//! Extraction of snapshot references from the tool's `list` output.

use std::sync::OnceLock;

use regex::Regex;

static SNAPSHOT_RE: OnceLock<Regex> = OnceLock::new();

fn snapshot_re() -> &'static Regex {
    SNAPSHOT_RE.get_or_init(|| {
        Regex::new(r"Snapshot (\S+) revision (\d+)").expect("hard-coded pattern compiles")
    })
}

/// One snapshot revision as reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub id: String,
    pub revision: u32,
}

/// Collect every `Snapshot <id> revision <n>` match from `output`, in
/// output order. All other text is ignored.
pub fn parse_list_output(output: &str) -> Vec<SnapshotRef> {
    snapshot_re()
        .captures_iter(output)
        .filter_map(|caps| {
            let id = caps.get(1)?.as_str().to_string();
            let revision = caps.get(2)?.as_str().parse().ok()?;
            Some(SnapshotRef { id, revision })
        })
        .collect()
}

/// The latest snapshot revision in `output`, or `None` when no line
/// matches.
///
/// The tool lists revisions in ascending order, so the last match is the
/// most recent one.
pub fn latest(output: &str) -> Option<SnapshotRef> {
    parse_list_output(output).into_iter().last()
}
