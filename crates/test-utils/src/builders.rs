#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use dupguard::config::{ConfigFile, NotifySection, RawConfigFile, SettingsSection};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        let mut settings = SettingsSection::default();
        settings.source_root = source_root.into();
        Self {
            config: RawConfigFile {
                settings,
                notify: None,
                tool_env: BTreeMap::new(),
            },
        }
    }

    pub fn tool_command(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.settings.tool_command = path.into();
        self
    }

    pub fn stamp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.settings.stamp_path = path.into();
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.settings.log_path = path.into();
        self
    }

    pub fn dry_run(mut self, val: bool) -> Self {
        self.config.settings.dry_run = val;
        self
    }

    pub fn num_logfiles(mut self, val: usize) -> Self {
        self.config.settings.num_logfiles = val;
        self
    }

    pub fn command_timeout_secs(mut self, val: u64) -> Self {
        self.config.settings.command_timeout_secs = Some(val);
        self
    }

    pub fn webhook(mut self, url: &str) -> Self {
        self.config.notify = Some(NotifySection {
            webhook_url: url.to_string(),
            probe_host: "localhost".to_string(),
        });
        self
    }

    pub fn tool_env(mut self, key: &str, value: &str) -> Self {
        self.config.tool_env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
