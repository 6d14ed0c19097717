//! Message table operations

use super::sessions::bump_message_count;
use super::types::{format_timestamp, now, Message, Role};
use super::{db_error, timestamp_column, SqliteStorage};
use crate::error::{ChatError, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

const SELECT_MESSAGES: &str = "SELECT role, content, created_at, session_id FROM messages";

impl SqliteStorage {
    /// Store a new message
    ///
    /// The session counter is not touched; see [`SqliteStorage::append_message`].
    pub fn insert_message(
        &self,
        role: Role,
        content: &str,
        session_id: Option<&str>,
    ) -> Result<Message> {
        let conn = self.connect()?;
        insert_row(&conn, role, content, session_id)
    }

    /// Store a message and bump its session's counter in one transaction
    ///
    /// # Errors
    ///
    /// Fails without writing anything when the session does not exist.
    pub fn append_message(&self, role: Role, content: &str, session_id: &str) -> Result<Message> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(|e| db_error("Failed to start transaction", e))?;

        let message = insert_row(&tx, role, content, Some(session_id))?;

        let updated = bump_message_count(&tx, session_id, &message.created_at)
            .map_err(|e| db_error("Failed to update message count", e))?;
        if updated == 0 {
            return Err(
                ChatError::Persistence(format!("Session not found: {}", session_id)).into(),
            );
        }

        tx.commit()
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        tracing::debug!(session_id, role = %role, "Appended message");
        Ok(message)
    }

    /// Messages in creation order, limited to one session when an id is given
    pub fn list_messages(&self, session_id: Option<&str>) -> Result<Vec<Message>> {
        let conn = self.connect()?;

        let messages = match session_id {
            Some(id) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "{} WHERE session_id = ?1 ORDER BY created_at ASC, id ASC",
                        SELECT_MESSAGES
                    ))
                    .map_err(|e| db_error("Failed to prepare statement", e))?;
                let rows = stmt
                    .query_map(params![id], message_from_row)
                    .map_err(|e| db_error("Failed to query messages", e))?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!(
                        "{} ORDER BY created_at ASC, id ASC",
                        SELECT_MESSAGES
                    ))
                    .map_err(|e| db_error("Failed to prepare statement", e))?;
                let rows = stmt
                    .query_map([], message_from_row)
                    .map_err(|e| db_error("Failed to query messages", e))?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
        }
        .map_err(|e| db_error("Failed to read message", e))?;

        Ok(messages)
    }

    /// Delete messages of one session, or every message when no id is given
    ///
    /// Returns the number of deleted rows.
    pub fn delete_messages(&self, session_id: Option<&str>) -> Result<usize> {
        let conn = self.connect()?;
        let deleted = match session_id {
            Some(id) => conn.execute("DELETE FROM messages WHERE session_id = ?1", params![id]),
            None => conn.execute("DELETE FROM messages", []),
        }
        .map_err(|e| db_error("Failed to delete messages", e))?;

        tracing::debug!(session_id = ?session_id, deleted, "Deleted messages");
        Ok(deleted)
    }
}

fn insert_row(
    conn: &Connection,
    role: Role,
    content: &str,
    session_id: Option<&str>,
) -> Result<Message> {
    let created_at = now();
    conn.execute(
        "INSERT INTO messages (role, content, created_at, session_id) VALUES (?1, ?2, ?3, ?4)",
        params![role.as_str(), content, format_timestamp(&created_at), session_id],
    )
    .map_err(|e| db_error("Failed to insert message", e))?;

    Ok(Message {
        role,
        content: content.to_string(),
        created_at,
        session_id: session_id.map(str::to_string),
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let raw_role: String = row.get(0)?;
    let role = Role::parse(&raw_role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("unknown role: {}", raw_role).into(),
        )
    })?;

    Ok(Message {
        role,
        content: row.get(1)?,
        created_at: timestamp_column(row, 2)?,
        session_id: row.get(3)?,
    })
}
