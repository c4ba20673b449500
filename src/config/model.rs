// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [settings]
/// tool_command = "/usr/local/bin/duplicacy"
/// stamp_path = "/var/lib/dupguard/stamps.json"
/// log_path = "/var/lib/dupguard/logs"
/// source_root = "/source_dirs"
/// num_logfiles = 5
///
/// [notify]
/// webhook_url = "https://example.com/hooks/backup"
///
/// [tool_env]
/// DUPLICACY_PASSWORD = "..."
/// ```
///
/// All sections except `[settings].source_root` are optional and have
/// reasonable defaults. This type is pure deserialization output; semantic
/// validation happens in [`ConfigFile::try_from`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub settings: SettingsSection,

    /// Optional `[notify]` section; absent means no notification is sent.
    #[serde(default)]
    pub notify: Option<NotifySection>,

    /// The *complete* environment for backup-tool invocations. This
    /// replaces the inherited environment rather than extending it, so
    /// credentials never leak in from the parent process.
    #[serde(default)]
    pub tool_env: BTreeMap<String, String>,
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Path to the backup tool binary.
    #[serde(default = "default_tool_command")]
    pub tool_command: PathBuf,

    /// Where the verification stamp file lives.
    #[serde(default = "default_stamp_path")]
    pub stamp_path: PathBuf,

    /// Root directory for per-step log files.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Directory whose immediate subdirectories are the backup sources.
    #[serde(default)]
    pub source_root: PathBuf,

    /// Log commands instead of executing them.
    #[serde(default)]
    pub dry_run: bool,

    /// How many log files to retain per (directory, step).
    #[serde(default = "default_num_logfiles")]
    pub num_logfiles: usize,

    /// Optional upper bound on one tool invocation, in seconds. Absent
    /// means wait indefinitely.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

fn default_tool_command() -> PathBuf {
    PathBuf::from("/usr/local/bin/duplicacy")
}

fn default_stamp_path() -> PathBuf {
    PathBuf::from("/var/lib/dupguard/stamps.json")
}

fn default_log_path() -> PathBuf {
    PathBuf::from("/var/lib/dupguard/logs")
}

fn default_num_logfiles() -> usize {
    5
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            tool_command: default_tool_command(),
            stamp_path: default_stamp_path(),
            log_path: default_log_path(),
            source_root: PathBuf::new(),
            dry_run: false,
            num_logfiles: default_num_logfiles(),
            command_timeout_secs: None,
        }
    }
}

/// `[notify]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifySection {
    /// Endpoint the run report is posted to.
    pub webhook_url: String,

    /// Host resolved to decide whether we are online before starting a run
    /// that will notify.
    #[serde(default = "default_probe_host")]
    pub probe_host: String,
}

fn default_probe_host() -> String {
    "www.google.de".to_string()
}

/// Validated configuration, produced via `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: SettingsSection,
    pub notify: Option<NotifySection>,
    pub tool_env: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Construct without re-validating. Callers go through
    /// `TryFrom<RawConfigFile>` instead.
    pub(crate) fn new_unchecked(
        settings: SettingsSection,
        notify: Option<NotifySection>,
        tool_env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            settings,
            notify,
            tool_env,
        }
    }
}
