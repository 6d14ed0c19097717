//! Session management on top of the session store

use super::blocking;
use crate::error::{ChatError, Result};
use crate::storage::{Session, SqliteStorage};

/// CRUD operations for chat sessions
#[derive(Debug, Clone)]
pub struct SessionService {
    storage: SqliteStorage,
}

impl SessionService {
    /// Create a new session service
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    /// Start a new session, using the default title when none is given
    pub async fn create(&self, title: Option<&str>) -> Result<Session> {
        let title = title.map(str::to_string);
        let session = blocking(&self.storage, move |storage| {
            storage.create_session(title.as_deref())
        })
        .await
        .map_err(|e| wrap("create", e))?;
        tracing::info!(session_id = %session.session_id, "Session created");
        Ok(session)
    }

    /// All sessions, most recently updated first
    pub async fn list(&self) -> Result<Vec<Session>> {
        blocking(&self.storage, |storage| storage.list_sessions())
            .await
            .map_err(|e| wrap("fetch", e))
    }

    /// Look up one session
    pub async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let id = session_id.to_string();
        blocking(&self.storage, move |storage| storage.get_session(&id))
            .await
            .map_err(|e| wrap("fetch", e))
    }

    /// Change a session's title
    ///
    /// # Errors
    ///
    /// * `ChatError::Validation` if the title is blank
    /// * `ChatError::NotFound` if the session does not exist
    pub async fn rename(&self, session_id: &str, title: &str) -> Result<Session> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::Validation("Title cannot be empty".to_string()).into());
        }

        let id = session_id.to_string();
        let title = title.to_string();
        blocking(&self.storage, move |storage| storage.rename_session(&id, &title))
            .await
            .map_err(|e| wrap("update", e))?
            .ok_or_else(|| ChatError::NotFound("Session not found".to_string()).into())
    }

    /// Delete a session and all of its messages
    ///
    /// Unknown ids succeed without doing anything.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        let id = session_id.to_string();
        blocking(&self.storage, move |storage| storage.delete_session(&id))
            .await
            .map_err(|e| wrap("delete", e))?;
        tracing::info!(session_id, "Session deleted");
        Ok(())
    }
}

fn wrap(op: &str, err: anyhow::Error) -> anyhow::Error {
    ChatError::Persistence(format!("Failed to {} session: {}", op, err)).into()
}
