//! Key/value persistence for the client-side chat store
//!
//! The chat store never talks to a concrete backend directly; it is handed
//! something implementing [`KeyValueStore`]. Two backends are provided:
//! [`SqliteStorage`] for durable state and [`MemoryStorage`] for tests and
//! throwaway sessions.

use crate::error::{ChatBridgeError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod memory;
pub mod types;

pub use memory::MemoryStorage;
pub use types::{ChatMessage, ChatSession, Role};

/// Size in bytes a single entry contributes to the persisted footprint
pub fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// String-keyed blob storage with an optional hard quota
pub trait KeyValueStore {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value
    ///
    /// # Errors
    ///
    /// Returns [`ChatBridgeError::StorageQuota`] when the write would exceed
    /// the backend's hard limit; the previous value is left in place.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>>;

    /// Total persisted size: sum of key and value bytes over every entry
    fn footprint(&self) -> Result<usize> {
        let mut total = 0;
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                total += entry_size(&key, &value);
            }
        }
        Ok(total)
    }

    /// Whether a key is present
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// SQLite-backed key/value storage
pub struct SqliteStorage {
    db_path: PathBuf,
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory.
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "chatbridge", "chatbridge")
            .ok_or_else(|| ChatBridgeError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("chat.db"))
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// This is primarily useful for tests where the default application data
    /// directory is not desirable (for example, using a temporary directory).
    ///
    /// # Examples
    ///
    /// ```
    /// use chatbridge::storage::{KeyValueStore, SqliteStorage};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let mut storage = SqliteStorage::new_with_path(dir.path().join("chat.db")).unwrap();
    /// storage.set("greeting", "hello").unwrap();
    /// assert_eq!(storage.get("greeting").unwrap().as_deref(), Some("hello"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for database")
                    .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)
            .context("Failed to open database")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;

        let storage = Self {
            db_path,
            conn,
            quota_bytes: None,
        };
        storage.init()?;

        tracing::debug!("Opened chat storage at {}", storage.db_path.display());
        Ok(storage)
    }

    /// Reject writes that would grow the footprint beyond `quota_bytes`
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Location of the backing database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )",
                [],
            )
            .context("Failed to create tables")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to query key")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let current = self.footprint()?;
            let replaced = self
                .get(key)?
                .map(|v| entry_size(key, &v))
                .unwrap_or(0);
            let projected = current - replaced + entry_size(key, value);
            if projected > quota {
                return Err(ChatBridgeError::StorageQuota(format!(
                    "writing {} would use {} of {} bytes",
                    key, projected, quota
                ))
                .into());
            }
        }

        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .context("Failed to write key")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete key")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .context("Failed to prepare statement")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;

        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("Failed to query keys")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;
        Ok(keys)
    }

    fn footprint(&self) -> Result<usize> {
        let total: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
                 FROM kv",
                [],
                |row| row.get(0),
            )
            .context("Failed to measure storage")
            .map_err(|e| ChatBridgeError::Storage(e.to_string()))?;
        Ok(total as usize)
    }
}
