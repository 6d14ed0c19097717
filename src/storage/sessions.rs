//! Session table operations

use super::types::{format_timestamp, now, Session, DEFAULT_SESSION_TITLE};
use super::{db_error, timestamp_column, SqliteStorage};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const SELECT_SESSIONS: &str =
    "SELECT session_id, title, created_at, updated_at, message_count FROM sessions";

impl SqliteStorage {
    /// Create a new session with a fresh identifier
    ///
    /// A missing or blank title becomes [`DEFAULT_SESSION_TITLE`].
    pub fn create_session(&self, title: Option<&str>) -> Result<Session> {
        let conn = self.connect()?;

        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => DEFAULT_SESSION_TITLE.to_string(),
        };
        let timestamp = now();
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            title,
            created_at: timestamp,
            updated_at: timestamp,
            message_count: 0,
        };

        let stamp = format_timestamp(&timestamp);
        conn.execute(
            "INSERT INTO sessions (session_id, title, created_at, updated_at, message_count)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![session.session_id, session.title, stamp, stamp],
        )
        .map_err(|e| db_error("Failed to create session", e))?;

        tracing::debug!(session_id = %session.session_id, "Created session");
        Ok(session)
    }

    /// Look up a session by id
    pub fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let conn = self.connect()?;
        fetch_session(&conn, session_id)
    }

    /// All sessions, most recently updated first
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "{} ORDER BY updated_at DESC, rowid DESC",
                SELECT_SESSIONS
            ))
            .map_err(|e| db_error("Failed to prepare statement", e))?;

        let rows = stmt
            .query_map([], session_from_row)
            .map_err(|e| db_error("Failed to query sessions", e))?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row.map_err(|e| db_error("Failed to read session", e))?);
        }
        Ok(sessions)
    }

    /// Change a session's title and refresh its update time
    ///
    /// Returns `None` when no session has the given id.
    pub fn rename_session(&self, session_id: &str, title: &str) -> Result<Option<Session>> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE sessions SET title = ?1, updated_at = ?2 WHERE session_id = ?3",
                params![title, format_timestamp(&now()), session_id],
            )
            .map_err(|e| db_error("Failed to update session", e))?;

        if updated == 0 {
            return Ok(None);
        }
        fetch_session(&conn, session_id)
    }

    /// Add one to a session's message count and refresh its update time
    ///
    /// A missing session is left alone.
    pub fn increment_message_count(&self, session_id: &str) -> Result<()> {
        let conn = self.connect()?;
        let updated = bump_message_count(&conn, session_id, &now())
            .map_err(|e| db_error("Failed to update message count", e))?;
        if updated == 0 {
            tracing::warn!(session_id, "Message count not updated: session not found");
        }
        Ok(())
    }

    /// Remove a session together with its messages
    ///
    /// Deleting an unknown id is not an error.
    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(|e| db_error("Failed to start transaction", e))?;

        let messages = tx
            .execute(
                "DELETE FROM messages WHERE session_id = ?1",
                params![session_id],
            )
            .map_err(|e| db_error("Failed to delete session messages", e))?;
        let sessions = tx
            .execute(
                "DELETE FROM sessions WHERE session_id = ?1",
                params![session_id],
            )
            .map_err(|e| db_error("Failed to delete session", e))?;

        tx.commit()
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        tracing::debug!(session_id, sessions, messages, "Deleted session");
        Ok(())
    }
}

/// Increment the counter of one session, returning the number of rows touched
pub(crate) fn bump_message_count(
    conn: &Connection,
    session_id: &str,
    at: &DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE sessions SET message_count = message_count + 1, updated_at = ?1
         WHERE session_id = ?2",
        params![format_timestamp(at), session_id],
    )
}

fn fetch_session(conn: &Connection, session_id: &str) -> Result<Option<Session>> {
    let session = conn
        .query_row(
            &format!("{} WHERE session_id = ?1", SELECT_SESSIONS),
            params![session_id],
            session_from_row,
        )
        .optional()
        .map_err(|e| db_error("Failed to query session", e))?;
    Ok(session)
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let count: i64 = row.get(4)?;
    Ok(Session {
        session_id: row.get(0)?,
        title: row.get(1)?,
        created_at: timestamp_column(row, 2)?,
        updated_at: timestamp_column(row, 3)?,
        message_count: count.max(0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_storage;
    use super::super::Role;
    use super::*;

    #[test]
    fn test_create_session_defaults_title() {
        let (storage, _dir) = create_test_storage();
        let session = storage.create_session(None).expect("create");
        assert_eq!(session.title, DEFAULT_SESSION_TITLE);
        assert_eq!(session.message_count, 0);
        assert_eq!(session.created_at, session.updated_at);
        assert!(Uuid::parse_str(&session.session_id).is_ok());

        let blank = storage.create_session(Some("   ")).expect("create blank");
        assert_eq!(blank.title, DEFAULT_SESSION_TITLE);
        assert_ne!(blank.session_id, session.session_id);
    }

    #[test]
    fn test_create_and_get_session() {
        let (storage, _dir) = create_test_storage();
        let created = storage.create_session(Some("Trip plans")).expect("create");
        let loaded = storage
            .get_session(&created.session_id)
            .expect("get")
            .expect("session exists");
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_get_missing_session_is_none() {
        let (storage, _dir) = create_test_storage();
        assert!(storage.get_session("nope").expect("get").is_none());
    }

    #[test]
    fn test_list_sessions_most_recent_first() {
        let (storage, _dir) = create_test_storage();
        let first = storage.create_session(Some("first")).expect("first");
        let second = storage.create_session(Some("second")).expect("second");

        let titles: Vec<String> = storage
            .list_sessions()
            .expect("list")
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);

        storage
            .increment_message_count(&first.session_id)
            .expect("bump");
        let order: Vec<String> = storage
            .list_sessions()
            .expect("list")
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        assert_eq!(order[0], first.session_id);
        assert_eq!(order[1], second.session_id);
    }

    #[test]
    fn test_rename_session() {
        let (storage, _dir) = create_test_storage();
        let session = storage.create_session(None).expect("create");
        let renamed = storage
            .rename_session(&session.session_id, "Renamed")
            .expect("rename")
            .expect("exists");
        assert_eq!(renamed.title, "Renamed");
        assert_eq!(renamed.created_at, session.created_at);
        assert!(renamed.updated_at >= session.updated_at);
    }

    #[test]
    fn test_rename_missing_session_returns_none() {
        let (storage, _dir) = create_test_storage();
        assert!(storage
            .rename_session("missing", "Title")
            .expect("rename")
            .is_none());
    }

    #[test]
    fn test_increment_message_count_missing_session_is_ok() {
        let (storage, _dir) = create_test_storage();
        assert!(storage.increment_message_count("missing").is_ok());
    }

    #[test]
    fn test_delete_session_cascades_to_messages() {
        let (storage, _dir) = create_test_storage();
        let doomed = storage.create_session(None).expect("doomed");
        let kept = storage.create_session(None).expect("kept");
        storage
            .append_message(Role::User, "bye", &doomed.session_id)
            .expect("append");
        storage
            .append_message(Role::User, "stay", &kept.session_id)
            .expect("append");

        storage.delete_session(&doomed.session_id).expect("delete");

        assert!(storage
            .get_session(&doomed.session_id)
            .expect("get")
            .is_none());
        assert!(storage
            .list_messages(Some(&doomed.session_id))
            .expect("list")
            .is_empty());
        assert_eq!(storage.list_messages(None).expect("list all").len(), 1);
    }

    #[test]
    fn test_delete_missing_session_is_ok() {
        let (storage, _dir) = create_test_storage();
        assert!(storage.delete_session("missing").is_ok());
    }
}
