// src/schedule/stamps.rs

//! Persistent record of when each directory was last fully verified.
//!
//! The store is a flat JSON object mapping the directory's absolute path to
//! an RFC-3339 timestamp. It is loaded once at the start of a run and
//! rewritten whole on every update; directories are processed sequentially,
//! so there is a single writer per run.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::{DupguardError, Result};

/// Abstract storage for verification stamps.
pub trait StampStore: Send {
    fn last_verified(&self, dir: &Path) -> Option<DateTime<Utc>>;
    fn record(&mut self, dir: &Path, at: DateTime<Utc>) -> Result<()>;
}

fn store_key(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

/// Stores stamps in a JSON file, rewritten whole on each record.
#[derive(Debug)]
pub struct FileStampStore {
    path: PathBuf,
    stamps: BTreeMap<String, DateTime<Utc>>,
}

impl FileStampStore {
    /// Load the store from `path`.
    ///
    /// A missing file is an empty store, not an error. An unreadable or
    /// unparsable file is logged and also treated as empty, so a damaged
    /// store degrades to "verify everything again" instead of aborting the
    /// run.
    pub fn load(path: PathBuf) -> Self {
        let stamps = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "stamp store unparsable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "stamp store unreadable, starting empty");
                BTreeMap::new()
            }
        };

        Self { path, stamps }
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DupguardError::PersistenceError(format!(
                    "creating stamp directory {:?}: {e}",
                    parent
                ))
            })?;
        }

        let file = File::create(&self.path).map_err(|e| {
            DupguardError::PersistenceError(format!("creating stamp file {:?}: {e}", self.path))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.stamps).map_err(|e| {
            DupguardError::PersistenceError(format!("serializing stamps to {:?}: {e}", self.path))
        })?;
        writer.flush().map_err(|e| {
            DupguardError::PersistenceError(format!("flushing stamp file {:?}: {e}", self.path))
        })?;
        Ok(())
    }
}

impl StampStore for FileStampStore {
    fn last_verified(&self, dir: &Path) -> Option<DateTime<Utc>> {
        self.stamps.get(&store_key(dir)).copied()
    }

    fn record(&mut self, dir: &Path, at: DateTime<Utc>) -> Result<()> {
        let key = store_key(dir);
        self.stamps.insert(key.clone(), at);
        self.persist()?;
        debug!(dir = %key, at = %at.to_rfc3339(), "stored verification stamp (file)");
        Ok(())
    }
}

/// Stores stamps in memory only. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryStampStore {
    stamps: BTreeMap<String, DateTime<Utc>>,
}

impl MemoryStampStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StampStore for MemoryStampStore {
    fn last_verified(&self, dir: &Path) -> Option<DateTime<Utc>> {
        self.stamps.get(&store_key(dir)).copied()
    }

    fn record(&mut self, dir: &Path, at: DateTime<Utc>) -> Result<()> {
        let key = store_key(dir);
        self.stamps.insert(key.clone(), at);
        debug!(dir = %key, at = %at.to_rfc3339(), "stored verification stamp (memory)");
        Ok(())
    }
}
