// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DupguardError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DupguardError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.settings, raw.notify, raw.tool_env))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_settings(cfg)?;
    validate_notify(cfg)?;
    Ok(())
}

fn validate_settings(cfg: &RawConfigFile) -> Result<()> {
    if cfg.settings.source_root.as_os_str().is_empty() {
        return Err(DupguardError::ConfigError(
            "[settings].source_root must be set".to_string(),
        ));
    }

    if cfg.settings.num_logfiles == 0 {
        return Err(DupguardError::ConfigError(
            "[settings].num_logfiles must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.settings.command_timeout_secs == Some(0) {
        return Err(DupguardError::ConfigError(
            "[settings].command_timeout_secs must be nonzero; omit it for no timeout".to_string(),
        ));
    }

    Ok(())
}

fn validate_notify(cfg: &RawConfigFile) -> Result<()> {
    if let Some(notify) = &cfg.notify {
        if !notify.webhook_url.starts_with("http://") && !notify.webhook_url.starts_with("https://")
        {
            return Err(DupguardError::ConfigError(format!(
                "[notify].webhook_url must be an http(s) URL (got '{}')",
                notify.webhook_url
            )));
        }
        if notify.probe_host.trim().is_empty() {
            return Err(DupguardError::ConfigError(
                "[notify].probe_host must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}
