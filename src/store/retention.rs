//! Age-based pruning of old snapshots.
//!
//! Sits on top of the store: insert and lookup never delete anything, the
//! host decides when (and whether) to run a prune.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::info;

use super::{Store, StoreError};

/// Keep snapshots younger than `keep_for`, drop everything older.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep_for: Duration,
}

impl RetentionPolicy {
    pub fn new(keep_for: Duration) -> Self {
        RetentionPolicy { keep_for }
    }

    /// Parse a humantime duration such as `"30d"` or `"2w 3d"`.
    pub fn parse(s: &str) -> Result<Self, humantime::DurationError> {
        humantime::parse_duration(s).map(RetentionPolicy::new)
    }

    /// Oldest creation time that survives a prune run at `now`.
    ///
    /// `None` when the window reaches past the representable range, in which
    /// case nothing is old enough to prune.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let window = chrono::Duration::from_std(self.keep_for).ok()?;
        now.checked_sub_signed(window)
    }

    /// Delete every snapshot that falls outside the window. Returns the number removed.
    pub fn apply(&self, store: &Store, now: DateTime<Utc>) -> Result<usize, StoreError> {
        match self.cutoff(now) {
            Some(cutoff) => store.prune_created_before(cutoff),
            None => Ok(0),
        }
    }
}

impl Store {
    /// Delete snapshots created strictly before `cutoff`. Returns the number removed.
    pub fn prune_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let removed = conn.execute(
            "DELETE FROM inventory_snapshot WHERE created_at < ?1",
            params![cutoff.timestamp()],
        )?;

        info!(removed, cutoff = %cutoff, "pruned snapshots");
        Ok(removed)
    }
}
