// src/schedule/mod.rs

//! Decides whether a directory is due for a full verification.

pub mod stamps;

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::errors::Result;

pub use stamps::{FileStampStore, MemoryStampStore, StampStore};

/// A directory whose last successful verification is older than this many
/// days gets a full chunk-level verification instead of the light check.
/// Policy constant, not derived data.
pub const VERIFY_INTERVAL_DAYS: i64 = 90;

/// Tracks verification stamps and answers "is a full verification due?".
#[derive(Debug)]
pub struct VerificationScheduler<S: StampStore> {
    store: S,
}

impl<S: StampStore> VerificationScheduler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// True when `dir` has never been verified or its last verification is
    /// more than [`VERIFY_INTERVAL_DAYS`] ago. The caller applies any force
    /// override on top (`force || is_due`).
    pub fn is_due(&self, dir: &Path, now: DateTime<Utc>) -> bool {
        match self.store.last_verified(dir) {
            Some(last) => {
                let age = now - last;
                info!(dir = %dir.display(), days = age.num_days(), "last verification age");
                age > Duration::days(VERIFY_INTERVAL_DAYS)
            }
            None => {
                info!(dir = %dir.display(), "no previous verification found");
                true
            }
        }
    }

    /// Upsert the stamp for `dir` and persist the store before the pipeline
    /// continues.
    pub fn record_success(&mut self, dir: &Path, now: DateTime<Utc>) -> Result<()> {
        self.store.record(dir, now)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
