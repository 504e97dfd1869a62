use crate::dlog;
use crate::types::{StoredWorkout, Workout};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

/// Key under which the whole workout list is stored.
pub const WORKOUTS_KEY: &str = "workouts";

/// Flat string key-value store. `set` replaces the whole value.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Key-value store in a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let shown = path.display();
        let conn =
            Connection::open(path).with_context(|| format!("Opening SQLite DB: {shown}"))?;
        tracing::debug!(path = %path.display(), "opened store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory SQLite DB")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        if !table_exists(&conn, "kv")? {
            tracing::info!("creating kv table");
            conn.execute_batch(
                r"
                CREATE TABLE kv (
                    key   TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                )
                ",
            )
            .context("Creating kv table")?;
        }
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("Reading key {key:?}"))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r"
                INSERT INTO kv (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                ",
                params![key, value],
            )
            .with_context(|| format!("Writing key {key:?}"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .with_context(|| format!("Removing key {key:?}"))?;
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

/// Read the persisted workout list.
///
/// A missing or unreadable value is treated as an empty list, and entries
/// that don't look like workouts are skipped.
pub fn load_workouts(store: &impl KeyValueStore) -> Result<Vec<Workout>> {
    let Some(raw) = store.get(WORKOUTS_KEY)? else {
        dlog!("no stored workouts");
        return Ok(Vec::new());
    };

    Ok(decode_workouts(&raw))
}

pub fn save_workouts(store: &mut impl KeyValueStore, workouts: &[Workout]) -> Result<()> {
    let json = serde_json::to_string(workouts).context("Serializing workouts")?;
    store.set(WORKOUTS_KEY, &json)?;
    dlog!("saved workouts count={} bytes={}", workouts.len(), json.len());
    Ok(())
}

fn decode_workouts(raw: &str) -> Vec<Workout> {
    let items: Vec<JsonValue> = match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(err = %e, "stored workouts are not a JSON array; ignoring");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<StoredWorkout>(item) {
            Ok(stored) => out.push(Workout::restore(stored)),
            Err(e) => tracing::warn!(idx, err = %e, "skipping malformed stored workout"),
        }
    }
    out
}
