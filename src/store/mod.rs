//! SQLite snapshot storage.
//!
//! Persists snapshots to a single `inventory_snapshots.sqlite` file:
//! - inventory_snapshot: id, owner_id, reason, inventory, created_at
//! - idx_inventory_snapshot_owner_id on owner_id
//!
//! Supports:
//! - Idempotent schema bootstrap on every startup
//! - Inserting a captured snapshot, the store assigns the id
//! - Loading a specific snapshot by id
//! - Listing the most recent snapshots of an owner
//!
//! Every operation opens its own connection, nothing is held between calls.
//! Rows are never updated; pruning lives in [`retention`].

pub mod retention;

use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::reason::SnapshotReason;
use crate::snapshot::Snapshot;

pub const DB_FILE_NAME: &str = "inventory_snapshots.sqlite";

/// Maximum number of snapshots returned by [`Store::find_recent_by_owner`].
pub const HISTORY_LIMIT: usize = 5;

// concurrent writers wait on each other instead of failing with SQLITE_BUSY
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "SELECT id, owner_id, reason, inventory, created_at FROM inventory_snapshot";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("snapshot already persisted with id {0}")]
    AlreadyPersisted(i64),

    #[error("snapshot timestamp {0} lies in the future")]
    FutureTimestamp(DateTime<Utc>),

    #[error("snapshot record {id} is corrupt: {reason}")]
    CorruptRecord { id: i64, reason: String },
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS inventory_snapshot (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id VARCHAR(36) NOT NULL,
            reason VARCHAR(32) NOT NULL,
            inventory BLOB NOT NULL,
            created_at DATETIME NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_inventory_snapshot_owner_id ON inventory_snapshot(owner_id)",
        [],
    )?;

    Ok(())
}

/// Handle to the snapshot database. Cheap to clone and share across threads.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open or create the database inside `dir` and make sure the schema exists.
    ///
    /// Safe to call on every startup. Fails with
    /// [`StoreError::StorageUnavailable`] when the location cannot be written.
    pub fn initialize(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(DB_FILE_NAME);
        let unavailable = |source: Box<dyn StdError + Send + Sync>| StoreError::StorageUnavailable {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(|e| unavailable(Box::new(e)))?;
        let conn = Connection::open(&path).map_err(|e| unavailable(Box::new(e)))?;
        init_schema(&conn).map_err(|e| unavailable(Box::new(e)))?;

        debug!(path = %path.display(), "snapshot store ready");
        Ok(Store { path })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        // no CREATE flag: a vanished file is an error, not a fresh empty store
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Persist an unsaved snapshot and return its newly assigned id.
    pub fn insert(&self, snapshot: &Snapshot) -> Result<i64, StoreError> {
        if snapshot.is_persisted() {
            return Err(StoreError::AlreadyPersisted(snapshot.id()));
        }
        if snapshot.created_at() > Utc::now() {
            return Err(StoreError::FutureTimestamp(snapshot.created_at()));
        }

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO inventory_snapshot (owner_id, reason, inventory, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.owner_id().to_string(),
                snapshot.reason().as_str(),
                snapshot.inventory(),
                snapshot.created_at().timestamp()
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(
            id,
            owner = %snapshot.owner_id(),
            reason = snapshot.reason().as_str(),
            bytes = snapshot.inventory().len(),
            "inserted snapshot"
        );
        Ok(id)
    }

    /// Get a specific snapshot by id. `None` when no record matches.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Snapshot>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;

        let row = stmt
            .query_row(params![id], SnapshotRow::from_row)
            .optional()?;

        row.map(SnapshotRow::into_snapshot).transpose()
    }

    /// The owner's most recent snapshots, newest first, at most [`HISTORY_LIMIT`].
    ///
    /// Rows that cannot be mapped back to a snapshot are logged and skipped.
    pub fn find_recent_by_owner(&self, owner_id: Uuid) -> Result<Vec<Snapshot>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE owner_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        ))?;

        let rows = stmt.query_map(
            params![owner_id.to_string(), HISTORY_LIMIT as i64],
            SnapshotRow::from_row,
        )?;

        let mut snapshots = Vec::with_capacity(HISTORY_LIMIT);
        for row in rows {
            match row.map_err(StoreError::from).and_then(SnapshotRow::into_snapshot) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(owner = %owner_id, error = %e, "skipping unreadable snapshot row"),
            }
        }

        Ok(snapshots)
    }
}

/// Column values as stored, before validation.
struct SnapshotRow {
    id: i64,
    owner_id: String,
    reason: String,
    inventory: Vec<u8>,
    created_at: i64,
}

impl SnapshotRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(SnapshotRow {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            reason: row.get(2)?,
            inventory: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_snapshot(self) -> Result<Snapshot, StoreError> {
        let corrupt = |reason: String| StoreError::CorruptRecord { id: self.id, reason };

        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| corrupt(format!("bad owner id '{}': {e}", self.owner_id)))?;
        let reason = self
            .reason
            .parse::<SnapshotReason>()
            .map_err(|e| corrupt(e.to_string()))?;
        let created_at = DateTime::from_timestamp(self.created_at, 0)
            .ok_or_else(|| corrupt(format!("timestamp {} out of range", self.created_at)))?;

        Ok(Snapshot::persisted(
            self.id,
            owner_id,
            reason,
            self.inventory,
            created_at,
        ))
    }
}
