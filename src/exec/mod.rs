// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] owns the generic process supervisor: spawn, concurrent
//!   stdout/stderr draining into an [`OutputSink`], capture, exit mapping.
//! - [`tool`] provides the [`BackupTool`] trait with the fixed backup-tool
//!   sub-operation contracts, and the concrete [`DuplicacyTool`] backend
//!   that tests can replace with a fake implementation.

pub mod command;
pub mod tool;

pub use command::{CommandSpec, OutputSink, OutputStream, ProcessOutcome, TracingSink, run_command};
pub use tool::{BackupTool, DuplicacyTool, RETENTION_TIERS};
