use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dupguard::errors::{DupguardError, Result};
use dupguard::exec::{BackupTool, OutputSink, OutputStream, ProcessOutcome};

/// A scripted `BackupTool` that never spawns processes.
///
/// - records every sub-operation (with arguments for the scoped check)
/// - reports success/failure per operation as configured
#[derive(Debug, Clone)]
pub struct FakeTool {
    pub backup_ok: bool,
    pub prune_ok: bool,
    /// stdout the `list` sub-operation reports; `None` makes it exit
    /// non-zero instead.
    pub list_output: Option<String>,
    pub check_snapshot_ok: bool,
    pub check_ok: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeTool {
    /// Everything succeeds; `list` reports a single revision.
    pub fn happy() -> Self {
        Self {
            backup_ok: true,
            prune_ok: true,
            list_output: Some("Snapshot fake revision 1".to_string()),
            check_snapshot_ok: true,
            check_ok: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn backup_ok(mut self, val: bool) -> Self {
        self.backup_ok = val;
        self
    }

    pub fn prune_ok(mut self, val: bool) -> Self {
        self.prune_ok = val;
        self
    }

    pub fn list_output(mut self, out: Option<&str>) -> Self {
        self.list_output = out.map(|s| s.to_string());
        self
    }

    pub fn check_snapshot_ok(mut self, val: bool) -> Self {
        self.check_snapshot_ok = val;
        self
    }

    pub fn check_ok(mut self, val: bool) -> Self {
        self.check_ok = val;
        self
    }

    /// The recorded sub-operations, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn outcome(&self, op: &str, ok: bool, stdout: &str) -> Result<ProcessOutcome> {
        if ok {
            Ok(ProcessOutcome {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            })
        } else {
            Err(DupguardError::ExecutionError {
                command: format!("fake {op}"),
                exit_code: 1,
                stdout: stdout.to_string(),
                stderr: "simulated failure".to_string(),
            })
        }
    }
}

#[async_trait]
impl BackupTool for FakeTool {
    async fn backup(&self, _repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome> {
        self.record("backup");
        sink.line(OutputStream::Stdout, "fake backup");
        self.outcome("backup", self.backup_ok, "")
    }

    async fn prune(&self, _repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome> {
        self.record("prune");
        sink.line(OutputStream::Stdout, "fake prune");
        self.outcome("prune", self.prune_ok, "")
    }

    async fn list_snapshots(
        &self,
        _repo: &Path,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessOutcome> {
        self.record("list");
        match &self.list_output {
            Some(out) => {
                for line in out.lines() {
                    sink.line(OutputStream::Stdout, line);
                }
                self.outcome("list", true, out)
            }
            None => self.outcome("list", false, ""),
        }
    }

    async fn check_snapshot(
        &self,
        _repo: &Path,
        snapshot_id: &str,
        revision: u32,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessOutcome> {
        self.record(format!("check_snapshot {snapshot_id} {revision}"));
        sink.line(OutputStream::Stdout, "fake chunk check");
        self.outcome("check_snapshot", self.check_snapshot_ok, "")
    }

    async fn check(&self, _repo: &Path, sink: &mut dyn OutputSink) -> Result<ProcessOutcome> {
        self.record("check");
        sink.line(OutputStream::Stdout, "fake check");
        self.outcome("check", self.check_ok, "")
    }
}
