use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Per-value size limit, matching what browsers give a single origin.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// A flat string-to-string medium with named slots.
pub trait KvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

fn check_quota(key: &str, value: &str, quota: usize) -> StoreResult<()> {
    let size = key.len() + value.len();
    if size > quota {
        return Err(StoreError::storage(format!(
            "quota exceeded writing '{}' ({} bytes, limit {})",
            key, size, quota
        )));
    }
    Ok(())
}

/// SQLite-backed key-value medium
#[derive(Debug)]
pub struct SqliteKv {
    conn: Connection,
    quota: usize,
}

impl SqliteKv {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %path.display(), "opening session database");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        // another instance holding the write lock makes us wait, not fail
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self {
            conn,
            quota: DEFAULT_QUOTA_BYTES,
        })
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        check_quota(key, value, self.quota)?;
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-process medium for tests and dry runs
#[derive(Debug)]
pub struct MemoryKv {
    slots: RefCell<HashMap<String, String>>,
    quota: usize,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            slots: RefCell::new(HashMap::new()),
            quota,
        }
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        check_quota(key, value, self.quota)?;
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}
