//! Conversation persistence backed by SQLite
//!
//! Messages and session metadata live in two tables of a single database
//! file. Every operation opens its own connection, so a `SqliteStorage` is
//! cheap to clone and share between request handlers.

use crate::error::{ChatError, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::Connection;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod messages;
mod sessions;
pub mod types;

pub use types::{Message, Role, Session, DEFAULT_SESSION_TITLE};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    message_count INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    role TEXT NOT NULL CHECK (role IN ('user', 'ai')),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    session_id TEXT
);
CREATE INDEX IF NOT EXISTS idx_messages_session ON messages (session_id, created_at);
CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions (updated_at);
";

/// Storage backend for chat sessions and messages
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Uses `CHATRELAY_DB_PATH` when set, otherwise a database file in the
    /// user's data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("CHATRELAY_DB_PATH") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("dev", "chatrelay", "chatrelay")
            .ok_or_else(|| ChatError::Persistence("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("chatrelay.db"))
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("chat.db")).unwrap();
    /// assert!(storage.db_path().exists());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    db_error("Failed to create parent directory for database", e)
                })?;
            }
        }

        let storage = Self { db_path };
        storage.init()?;
        tracing::debug!("Opened chat database at {}", storage.db_path.display());
        Ok(storage)
    }

    /// Open the configured database, falling back to the default location
    pub fn from_config(config: &crate::config::StorageConfig) -> Result<Self> {
        match &config.db_path {
            Some(path) => Self::new_with_path(path),
            None => Self::new(),
        }
    }

    /// Location of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| db_error("Failed to create tables", e))?;
        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .map_err(|e| db_error("Failed to open database", e))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| db_error("Failed to configure database", e))?;
        Ok(conn)
    }
}

/// Wrap a low-level failure as a persistence error
pub(crate) fn db_error(action: &str, err: impl Display) -> ChatError {
    ChatError::Persistence(format!("{}: {}", action, err))
}

/// Read an RFC 3339 column into a UTC timestamp
pub(crate) fn timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
