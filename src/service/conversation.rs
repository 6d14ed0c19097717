//! Conversation orchestration
//!
//! One inbound user turn runs start to finish here: validate the text,
//! resolve the session, persist the user message, auto-title the session,
//! replay the full history to the provider, and persist the reply.

use super::blocking;
use crate::error::{ChatError, Result};
use crate::providers::{ChatTurn, Provider};
use crate::storage::{Message, Role, Session, SqliteStorage, DEFAULT_SESSION_TITLE};
use std::sync::Arc;

/// Longest accepted message, counted in characters after trimming
pub const MAX_CONTENT_CHARS: usize = 500;

/// Longest automatic session title before the ellipsis
pub const TITLE_MAX_CHARS: usize = 50;

/// Drives a conversation between the store and the inference provider
#[derive(Clone)]
pub struct ConversationService {
    storage: SqliteStorage,
    provider: Arc<dyn Provider>,
}

impl ConversationService {
    /// Create a new conversation service
    pub fn new(storage: SqliteStorage, provider: Arc<dyn Provider>) -> Self {
        Self { storage, provider }
    }

    /// Handle one user turn and return the stored assistant reply
    ///
    /// A missing or unknown `session_id` starts a new session. When the
    /// provider fails, the user message stays stored and the provider's
    /// error is returned unchanged.
    ///
    /// # Errors
    ///
    /// * `ChatError::Validation` if the content is blank or too long
    /// * `ChatError::Persistence` if the store fails
    /// * any inference error raised by the provider
    pub async fn send_message(&self, content: &str, session_id: Option<&str>) -> Result<Message> {
        let content = validate_content(content)?.to_string();
        let requested = session_id.map(str::to_string);

        let (session_id, turns) = blocking(&self.storage, move |storage| {
            record_user_turn(storage, &content, requested.as_deref())
        })
        .await
        .map_err(process_error)?;

        tracing::debug!(session_id = %session_id, turns = turns.len(), "Requesting completion");
        let reply = self.provider.chat(&turns).await?;

        let target = session_id.clone();
        let message = blocking(&self.storage, move |storage| {
            storage.append_message(Role::Ai, &reply, &target)
        })
        .await
        .map_err(process_error)?;

        tracing::info!(session_id = %session_id, "Conversation turn completed");
        Ok(message)
    }

    /// Stored messages, optionally limited to one session
    pub async fn list_messages(&self, session_id: Option<&str>) -> Result<Vec<Message>> {
        let scope = session_id.map(str::to_string);
        blocking(&self.storage, move |storage| {
            storage.list_messages(scope.as_deref())
        })
        .await
        .map_err(|e| wrap("Failed to fetch messages", e))
    }

    /// Delete stored messages, optionally limited to one session
    ///
    /// Returns the number of deleted messages.
    pub async fn clear_messages(&self, session_id: Option<&str>) -> Result<usize> {
        let scope = session_id.map(str::to_string);
        let deleted = blocking(&self.storage, move |storage| {
            storage.delete_messages(scope.as_deref())
        })
        .await
        .map_err(|e| wrap("Failed to clear messages", e))?;
        tracing::info!(session_id = ?session_id, deleted, "Cleared messages");
        Ok(deleted)
    }

    /// Model the provider talks to
    pub fn model(&self) -> String {
        self.provider.model()
    }

    /// Base URL of the provider
    pub fn provider_host(&self) -> String {
        self.provider.host()
    }
}

/// Store the user message and return its session id and the history to replay
fn record_user_turn(
    storage: &SqliteStorage,
    content: &str,
    session_id: Option<&str>,
) -> Result<(String, Vec<ChatTurn>)> {
    let session = resolve_session(storage, session_id)?;
    let session_id = session.session_id;

    storage.append_message(Role::User, content, &session_id)?;
    maybe_auto_title(storage, &session_id, content)?;

    let history = storage.list_messages(Some(&session_id))?;
    let turns = history.iter().map(ChatTurn::from).collect();
    Ok((session_id, turns))
}

fn resolve_session(storage: &SqliteStorage, session_id: Option<&str>) -> Result<Session> {
    if let Some(id) = session_id.filter(|id| !id.is_empty()) {
        if let Some(session) = storage.get_session(id)? {
            return Ok(session);
        }
        tracing::debug!(session_id = id, "Unknown session, starting a new one");
    }
    storage.create_session(None)
}

fn maybe_auto_title(storage: &SqliteStorage, session_id: &str, content: &str) -> Result<()> {
    let Some(session) = storage.get_session(session_id)? else {
        return Ok(());
    };
    if session.message_count == 1 && session.title == DEFAULT_SESSION_TITLE {
        let title = derive_title(content);
        tracing::debug!(session_id, title = %title, "Auto-titling session");
        storage.rename_session(session_id, &title)?;
    }
    Ok(())
}

/// Check message text and return it trimmed
///
/// # Examples
///
/// ```
/// use chatrelay::service::validate_content;
///
/// assert_eq!(validate_content("  hi  ").unwrap(), "hi");
/// assert!(validate_content("   ").is_err());
/// ```
pub fn validate_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ChatError::Validation("Message content cannot be empty".to_string()).into());
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(ChatError::Validation(format!(
            "Message content cannot exceed {} characters",
            MAX_CONTENT_CHARS
        ))
        .into());
    }
    Ok(trimmed)
}

/// Session title derived from the first message
///
/// # Examples
///
/// ```
/// use chatrelay::service::derive_title;
///
/// assert_eq!(derive_title("hi"), "hi");
/// assert_eq!(derive_title(&"a".repeat(60)), format!("{}...", "a".repeat(50)));
/// ```
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn wrap(action: &str, err: anyhow::Error) -> anyhow::Error {
    ChatError::Persistence(format!("{}: {}", action, err)).into()
}

fn process_error(err: anyhow::Error) -> anyhow::Error {
    wrap("Failed to process message", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TurnRole;
    use crate::test_utils::{assert_chat_error, temp_storage, MockProvider};

    fn service_with(provider: MockProvider) -> (ConversationService, SqliteStorage, tempfile::TempDir) {
        let (storage, dir) = temp_storage();
        let service = ConversationService::new(storage.clone(), Arc::new(provider));
        (service, storage, dir)
    }

    #[test]
    fn test_validate_content_trims() {
        assert_eq!(validate_content("\n hello \t").unwrap(), "hello");
    }

    #[test]
    fn test_validate_content_rejects_blank() {
        assert_chat_error(
            validate_content(" \n\t "),
            "VALIDATION_ERROR",
            "Message content cannot be empty",
        );
    }

    #[test]
    fn test_validate_content_length_counts_characters() {
        let at_limit = "é".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&at_limit).is_ok());

        let padded = format!("  {}  ", "x".repeat(MAX_CONTENT_CHARS));
        assert!(validate_content(&padded).is_ok());

        assert_chat_error(
            validate_content(&"x".repeat(MAX_CONTENT_CHARS + 1)),
            "VALIDATION_ERROR",
            "Message content cannot exceed 500 characters",
        );
    }

    #[test]
    fn test_derive_title_boundaries() {
        let exact = "b".repeat(TITLE_MAX_CHARS);
        assert_eq!(derive_title(&exact), exact);

        let long = "c".repeat(TITLE_MAX_CHARS + 1);
        assert_eq!(derive_title(&long), format!("{}...", "c".repeat(50)));

        let wide = "日".repeat(60);
        assert_eq!(derive_title(&wide).chars().count(), TITLE_MAX_CHARS + 3);
    }

    #[tokio::test]
    async fn test_send_message_creates_session_and_titles_it() {
        let provider = MockProvider::replying("Hello! How can I help?");
        let (service, storage, _dir) = service_with(provider.clone());

        let reply = service.send_message("  hi  ", None).await.unwrap();
        assert_eq!(reply.role, Role::Ai);
        assert_eq!(reply.content, "Hello! How can I help?");

        let session_id = reply.session_id.clone().expect("reply carries session");
        let session = storage.get_session(&session_id).unwrap().unwrap();
        assert_eq!(session.title, "hi");
        assert_eq!(session.message_count, 2);

        let stored = storage.list_messages(Some(&session_id)).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].content, "hi");
        assert_eq!(stored[0].role, Role::User);

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec![ChatTurn::user("hi")]);
    }

    #[tokio::test]
    async fn test_send_message_replays_history_and_keeps_title() {
        let provider = MockProvider::replying("ok");
        let (service, storage, _dir) = service_with(provider.clone());

        let first = service.send_message("first question", None).await.unwrap();
        let session_id = first.session_id.unwrap();
        service
            .send_message("second question", Some(&session_id))
            .await
            .unwrap();

        let session = storage.get_session(&session_id).unwrap().unwrap();
        assert_eq!(session.title, "first question");
        assert_eq!(session.message_count, 4);

        let calls = provider.calls();
        let roles: Vec<TurnRole> = calls[1].iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![TurnRole::User, TurnRole::Assistant, TurnRole::User]
        );
        assert_eq!(calls[1][2].content, "second question");
    }

    #[tokio::test]
    async fn test_send_message_unknown_session_starts_new_one() {
        let (service, storage, _dir) = service_with(MockProvider::replying("ok"));

        let reply = service
            .send_message("hello", Some("does-not-exist"))
            .await
            .unwrap();
        let session_id = reply.session_id.unwrap();
        assert_ne!(session_id, "does-not-exist");
        assert!(storage.get_session(&session_id).unwrap().is_some());
        assert!(storage.get_session("does-not-exist").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_message_renamed_session_is_not_auto_titled() {
        let (service, storage, _dir) = service_with(MockProvider::replying("ok"));
        let session = storage.create_session(Some("Custom")).unwrap();

        service
            .send_message("hi", Some(&session.session_id))
            .await
            .unwrap();

        let session = storage.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(session.title, "Custom");
    }

    #[tokio::test]
    async fn test_send_message_long_first_message_truncates_title() {
        let (service, storage, _dir) = service_with(MockProvider::replying("ok"));
        let content = "z".repeat(120);

        let reply = service.send_message(&content, None).await.unwrap();
        let session = storage
            .get_session(&reply.session_id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(session.title, format!("{}...", "z".repeat(50)));
    }

    #[tokio::test]
    async fn test_send_message_invalid_content_writes_nothing() {
        let provider = MockProvider::replying("ok");
        let (service, storage, _dir) = service_with(provider.clone());

        let result = service.send_message("   ", None).await;
        assert_chat_error(result, "VALIDATION_ERROR", "cannot be empty");

        assert!(storage.list_sessions().unwrap().is_empty());
        assert!(storage.list_messages(None).unwrap().is_empty());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_inference_failure_keeps_user_message() {
        let (service, storage, _dir) = service_with(MockProvider::unreachable());

        let result = service.send_message("hello", None).await;
        assert_chat_error(
            result,
            "OLLAMA_CONNECTION_ERROR",
            "Ollama service is not running",
        );

        let sessions = storage.list_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].message_count, 1);
        assert_eq!(sessions[0].title, "hello");

        let messages = storage.list_messages(None).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_list_and_clear_messages_scoped() {
        let (service, _storage, _dir) = service_with(MockProvider::replying("ok"));

        let a = service.send_message("a", None).await.unwrap();
        let b = service.send_message("b", None).await.unwrap();
        let a_id = a.session_id.unwrap();
        let b_id = b.session_id.unwrap();

        assert_eq!(service.list_messages(None).await.unwrap().len(), 4);
        assert_eq!(service.list_messages(Some(&a_id)).await.unwrap().len(), 2);

        assert_eq!(service.clear_messages(Some(&a_id)).await.unwrap(), 2);
        assert!(service.list_messages(Some(&a_id)).await.unwrap().is_empty());
        assert_eq!(service.list_messages(Some(&b_id)).await.unwrap().len(), 2);

        assert_eq!(service.clear_messages(None).await.unwrap(), 2);
        assert!(service.list_messages(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_wrapped() {
        let (storage, dir) = temp_storage();
        let service = ConversationService::new(storage, Arc::new(MockProvider::replying("ok")));
        std::fs::remove_dir_all(dir.path()).unwrap();
        std::fs::create_dir_all(dir.path().join("chat.db")).unwrap();

        assert_chat_error(
            service.list_messages(None).await,
            "DATABASE_ERROR",
            "Failed to fetch messages",
        );
    }
}
