//! SQLite-backed persistence for progress records, the planned queue and
//! the mistake log.
//!
//! Tables:
//! ```text
//! progress          (user_id, item_id) -> stage, timestamps, JSON history
//! planned_entries   (user_id, item_id) -> created_at
//! recent_mistakes   id -> user_id, item_id, timestamp
//! ```
//!
//! All access goes through one connection behind a mutex, and each public
//! operation runs inside its own transaction. A read-modify-write on a
//! progress record therefore can never interleave with another one.

mod mistakes;
pub mod models;
mod planned;
mod progress;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, Transaction};

use crate::error::{Result, SrsError};

pub use models::*;

/// Storage manager for all per-user SRS state
pub struct SrsStorage {
    conn: Mutex<Connection>,
}

impl SrsStorage {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        log::info!("Opened SRS database at {}", path.display());
        Self::init(conn)
    }

    /// A throwaway database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS progress (
                user_id TEXT NOT NULL,
                item_id INTEGER NOT NULL,
                stage TEXT NOT NULL DEFAULT 'locked',
                unlocked_at TEXT,
                last_reviewed_at TEXT,
                next_review_at TEXT,
                review_history TEXT NOT NULL DEFAULT '[]',
                user_synonyms TEXT NOT NULL DEFAULT '[]',
                user_sentences TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (user_id, item_id)
            );

            CREATE TABLE IF NOT EXISTS planned_entries (
                user_id TEXT NOT NULL,
                item_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, item_id)
            );

            CREATE TABLE IF NOT EXISTS recent_mistakes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                item_id INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_progress_next_review ON progress(user_id, next_review_at);
            CREATE INDEX IF NOT EXISTS idx_progress_stage ON progress(user_id, stage);
            CREATE INDEX IF NOT EXISTS idx_mistakes_user_time ON recent_mistakes(user_id, timestamp);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SrsError::StoragePoisoned)
    }

    /// Run `f` inside one transaction; commit on `Ok`, roll back on `Err`
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Remove everything stored for a user (account teardown)
    pub fn delete_user(&self, user_id: uuid::Uuid) -> Result<()> {
        let user = user_id.to_string();
        self.transaction(|tx| {
            tx.execute("DELETE FROM progress WHERE user_id = ?1", [&user])?;
            tx.execute("DELETE FROM planned_entries WHERE user_id = ?1", [&user])?;
            tx.execute("DELETE FROM recent_mistakes WHERE user_id = ?1", [&user])?;
            Ok(())
        })?;
        log::info!("Deleted all SRS data for user {}", user_id);
        Ok(())
    }
}

/// Fixed-width UTC text, so string order matches time order in SQL
/// `at` cut down to the millisecond precision timestamps are stored with,
/// so values handed back to callers match what a later read returns
pub fn stored_time(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

pub(crate) fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| SrsError::CorruptRecord(format!("bad timestamp {:?}: {}", text, e)))
}

pub(crate) fn decode_optional_time(text: Option<String>) -> Result<Option<DateTime<Utc>>> {
    text.as_deref().map(decode_time).transpose()
}
