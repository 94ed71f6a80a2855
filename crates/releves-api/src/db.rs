//! Server-side reading storage
//!
//! Each reading is one row keyed by its timestamp in epoch seconds. That key
//! is the authoritative id handed back to clients.

use std::path::Path;

use releves_core::models::validation::{parse_decimal, parse_integer};
use releves_core::sync::wire::ServerEntry;
use releves_core::util::{format_timestamp, local_from_epoch_seconds};
use releves_core::Entry;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// A validated reading in storage form.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub ts: i64,
    pub sensors: [Option<f64>; 3],
    pub supplement: bool,
    pub meter_index: Option<i64>,
}

impl Reading {
    /// Storage form of a validated entry taken at `ts`.
    pub fn from_entry(ts: i64, entry: &Entry) -> Self {
        let [s1, s2, s3] = entry.sensors();
        Self {
            ts,
            sensors: [parse_decimal(s1), parse_decimal(s2), parse_decimal(s3)],
            supplement: entry.supplement_flag,
            meter_index: parse_integer(&entry.meter_index),
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ts: row.get(0)?,
            sensors: [row.get(1)?, row.get(2)?, row.get(3)?],
            supplement: row.get(4)?,
            meter_index: row.get(5)?,
        })
    }

    pub fn into_server_entry(self) -> ServerEntry {
        let text = |value: Option<f64>| value.map(|value| value.to_string()).unwrap_or_default();
        let [s1, s2, s3] = self.sensors;
        ServerEntry {
            id: self.ts,
            dt: local_from_epoch_seconds(self.ts)
                .map(|taken_at| format_timestamp(&taken_at))
                .unwrap_or_default(),
            s1: text(s1),
            s2: text(s2),
            s3: text(s3),
            elec: self
                .meter_index
                .map(|index| index.to_string())
                .unwrap_or_default(),
            app: self.supplement,
        }
    }
}

pub struct ReadingStore {
    conn: Connection,
}

impl ReadingStore {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::debug!("Opened readings database at {}", path.display());
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> rusqlite::Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Meter index of the latest reading strictly before `ts`.
    ///
    /// The row being replaced (`excluding`) is ignored so an update is never
    /// compared with its own previous value.
    pub fn previous_meter_index(&self, ts: i64, excluding: i64) -> rusqlite::Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT meter_index FROM readings
                 WHERE ts < ?1 AND ts != ?2 AND meter_index IS NOT NULL
                 ORDER BY ts DESC LIMIT 1",
                params![ts, excluding],
                |row| row.get(0),
            )
            .optional()
    }

    /// Store a reading; `previous_id > 0` moves that row to the reading's timestamp.
    ///
    /// Saving the same reading twice leaves a single row.
    pub fn save(&mut self, previous_id: i64, reading: &Reading) -> rusqlite::Result<i64> {
        let tx = self.conn.transaction()?;
        if previous_id > 0 && previous_id != reading.ts {
            let moved = tx.execute("DELETE FROM readings WHERE ts = ?1", [previous_id])?;
            if moved == 0 {
                tracing::warn!(previous_id, "Updated reading not found, storing as new");
            }
        }
        let [s1, s2, s3] = reading.sensors;
        tx.execute(
            "INSERT INTO readings (ts, sensor1, sensor2, sensor3, supplement, meter_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(ts) DO UPDATE SET
                sensor1 = excluded.sensor1,
                sensor2 = excluded.sensor2,
                sensor3 = excluded.sensor3,
                supplement = excluded.supplement,
                meter_index = excluded.meter_index",
            params![reading.ts, s1, s2, s3, reading.supplement, reading.meter_index],
        )?;
        tx.commit()?;
        Ok(reading.ts)
    }

    /// Readings in `(after, until]`, newest first.
    pub fn list_window(&self, after: i64, until: i64) -> rusqlite::Result<Vec<Reading>> {
        let mut stmt = self.conn.prepare(
            "SELECT ts, sensor1, sensor2, sensor3, supplement, meter_index
             FROM readings WHERE ts > ?1 AND ts <= ?2
             ORDER BY ts DESC",
        )?;
        let rows = stmt.query_map(params![after, until], Reading::from_row)?;
        rows.collect()
    }
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;
    let version: i32 = if exists {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?
    } else {
        0
    };

    if version < 1 {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );
            CREATE TABLE IF NOT EXISTS readings (
                ts INTEGER PRIMARY KEY,
                sensor1 REAL,
                sensor2 REAL,
                sensor3 REAL,
                supplement INTEGER NOT NULL DEFAULT 0,
                meter_index INTEGER
            );
            INSERT INTO schema_version (version) VALUES (1);",
        )?;
        tx.commit()?;
        tracing::info!("Migrated readings database to version 1");
    }

    Ok(())
}
