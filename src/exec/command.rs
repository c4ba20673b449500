// src/exec/command.rs

//! Supervised execution of a single external command.
//!
//! The supervisor owns the full lifecycle of one tool invocation:
//!
//! - spawn with a fully *replaced* environment (credentials are passed in
//!   explicitly and never inherited from the parent process),
//! - drain stdout and stderr concurrently, forwarding every line to an
//!   [`OutputSink`] tagged with its stream,
//! - wait for the exit status only after both streams hit end-of-stream,
//! - map non-zero exits to [`DupguardError::ExecutionError`] carrying the
//!   captured output.
//!
//! Draining the two pipes sequentially can deadlock against a child that
//! blocks writing to the other pipe once the OS buffer fills, so both
//! streams get their own Tokio task.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{DupguardError, Result};

/// One external command invocation: argument vector, working directory and
/// the complete environment the process will see.
///
/// Immutable once constructed; consumed by a single [`run_command`] call.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Full replacement for the process environment, never merged with the
    /// ambient one.
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Human-readable command line, used in logs and error messages.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Which of the child's output channels a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// Scoped logging sink for one step's tool output.
///
/// The orchestrator acquires a sink per step and passes it in explicitly;
/// the supervisor never touches global logger state.
pub trait OutputSink: Send {
    fn line(&mut self, stream: OutputStream, line: &str);
}

/// Fallback sink that only forwards lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn line(&mut self, stream: OutputStream, line: &str) {
        info!(stream = stream.as_str(), "{}", line);
    }
}

/// Result of one supervised command execution.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Outcome reported for commands skipped in dry-run mode.
    pub fn dry_run() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Run `spec` to completion under supervision.
///
/// In dry-run mode the command is never launched; the would-be command line
/// is logged and an exit-code-0 outcome with empty captured text is
/// returned.
///
/// `timeout` bounds the whole invocation (drain + wait). On expiry the
/// child is killed and reaped and [`DupguardError::TimeoutError`] is
/// returned. `None` means wait indefinitely.
pub async fn run_command(
    spec: &CommandSpec,
    dry_run: bool,
    timeout: Option<Duration>,
    sink: &mut dyn OutputSink,
) -> Result<ProcessOutcome> {
    let command_line = spec.display_line();

    if dry_run {
        info!(cmd = %command_line, "would run command (dry-run)");
        return Ok(ProcessOutcome::dry_run());
    }

    debug!(cmd = %command_line, cwd = %spec.cwd.display(), "running command");

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.cwd)
        .env_clear()
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| DupguardError::LaunchError {
        command: command_line.clone(),
        source,
    })?;

    // The pipes are always present with Stdio::piped(); treat their absence
    // as a launch-level failure rather than panicking.
    let stdout = child.stdout.take().ok_or_else(|| DupguardError::LaunchError {
        command: command_line.clone(),
        source: std::io::Error::other("child stdout pipe missing"),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| DupguardError::LaunchError {
        command: command_line.clone(),
        source: std::io::Error::other("child stderr pipe missing"),
    })?;

    // One drain task per stream; lines are fanned into a single channel so
    // the sink can stay a plain `&mut` without locking. The channel closes
    // once both drains hit end-of-stream.
    let (line_tx, mut line_rx) = mpsc::channel::<(OutputStream, String)>(64);
    let stdout_task = tokio::spawn(drain_stream(stdout, OutputStream::Stdout, line_tx.clone()));
    let stderr_task = tokio::spawn(drain_stream(stderr, OutputStream::Stderr, line_tx));

    let mut captured_stdout = String::new();
    let mut captured_stderr = String::new();

    let supervise = async {
        while let Some((stream, line)) = line_rx.recv().await {
            sink.line(stream, &line);
            let buf = match stream {
                OutputStream::Stdout => &mut captured_stdout,
                OutputStream::Stderr => &mut captured_stderr,
            };
            buf.push_str(&line);
            buf.push('\n');
        }

        // Both streams are fully drained here; surface any abnormal reader
        // termination before looking at the exit status.
        let stdout_res = stdout_task.await;
        let stderr_res = stderr_task.await;
        for res in [stdout_res, stderr_res] {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(io_err)) => return Err(DupguardError::IoError(io_err)),
                Err(join_err) => {
                    return Err(DupguardError::Other(anyhow::anyhow!(
                        "output drain task failed: {join_err}"
                    )));
                }
            }
        }

        child.wait().await.map_err(DupguardError::IoError)
    };

    let status_res = match timeout {
        Some(limit) => {
            let timed = tokio::time::timeout(limit, supervise).await;
            match timed {
                Ok(res) => res,
                Err(_) => {
                    warn!(cmd = %command_line, "command timed out, killing");
                    // kill() also reaps the child, so no zombie is left behind.
                    if let Err(e) = child.kill().await {
                        warn!(cmd = %command_line, error = %e, "failed to kill timed-out child");
                    }
                    return Err(DupguardError::TimeoutError {
                        command: command_line,
                        timeout_secs: limit.as_secs(),
                    });
                }
            }
        }
        None => supervise.await,
    };

    let status = match status_res {
        Ok(status) => status,
        Err(err) => {
            // A drain failure is not end-of-stream: terminate the child and
            // reap it before propagating.
            if let Err(e) = child.kill().await {
                warn!(cmd = %command_line, error = %e, "failed to kill child after drain error");
            }
            return Err(err);
        }
    };

    let exit_code = status.code().unwrap_or(-1);
    debug!(cmd = %command_line, exit_code, success = status.success(), "command exited");

    if !status.success() {
        return Err(DupguardError::ExecutionError {
            command: command_line,
            exit_code,
            stdout: captured_stdout,
            stderr: captured_stderr,
        });
    }

    Ok(ProcessOutcome {
        exit_code,
        stdout: captured_stdout,
        stderr: captured_stderr,
    })
}

/// Read `reader` line by line until end-of-stream, forwarding each line
/// tagged with `stream`. Returns the first read error, if any.
async fn drain_stream<R>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::Sender<(OutputStream, String)>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if tx.send((stream, line)).await.is_err() {
            // Receiver gone; nothing left to forward to.
            break;
        }
    }
    Ok(())
}
