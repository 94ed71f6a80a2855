//! Key/value storage of the entry collection

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{Error, Result};
use crate::models::Entry;
use crate::util::unix_timestamp_now;

/// Durable client-side storage of entry collections, keyed by storage key.
///
/// Both operations are synchronous and replace or return the whole
/// collection; there is no partial update.
pub trait LocalStore {
    /// Load the collection stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Vec<Entry>>>;

    /// Store `entries` under `key`, replacing any previous collection
    fn set(&self, key: &str, entries: &[Entry]) -> Result<()>;
}

/// `SQLite` implementation of `LocalStore`
///
/// Each collection is one JSON document in the `local_storage` table.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }
}

impl LocalStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<Entry>>> {
        let raw: Option<String> = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| serde_json::from_str(&raw).map_err(Error::from))
            .transpose()
    }

    fn set(&self, key: &str, entries: &[Entry]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.db.connection().execute(
            "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, raw, unix_timestamp_now()],
        )?;
        tracing::debug!(key, count = entries.len(), "Stored entry collection");
        Ok(())
    }
}

/// In-memory `LocalStore`, shared between clones.
///
/// Collections are kept serialized so the same encoding path as the on-disk
/// store is exercised.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |values| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::Database("memory store lock poisoned".to_string()))
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<Entry>>> {
        let values = self.lock()?;
        values
            .get(key)
            .map(|raw| serde_json::from_str(raw).map_err(Error::from))
            .transpose()
    }

    fn set(&self, key: &str, entries: &[Entry]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.lock()?.insert(key.to_string(), raw);
        Ok(())
    }
}
