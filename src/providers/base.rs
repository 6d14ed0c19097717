//! Base provider trait and conversation types
//!
//! This module defines the Provider trait that inference backends implement,
//! along with the turn type sent to them.

use crate::error::Result;
use crate::storage::{Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Speaker of a turn on the inference wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The person chatting
    User,
    /// The model
    Assistant,
}

impl From<Role> for TurnRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Ai => Self::Assistant,
        }
    }
}

/// One message of the conversation replayed to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who said it
    pub role: TurnRole,
    /// What was said
    pub content: String,
}

impl ChatTurn {
    /// Creates a new user turn
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::providers::{ChatTurn, TurnRole};
    ///
    /// let turn = ChatTurn::user("Hello");
    /// assert_eq!(turn.role, TurnRole::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.into(),
            content: message.content.clone(),
        }
    }
}

/// Inference backend used by the conversation service
///
/// Implementations perform one non-streaming completion per call.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation and returns the assistant's reply text
    ///
    /// # Arguments
    ///
    /// * `turns` - Conversation history, oldest first
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::ChatError`] describing why the backend
    /// could not produce a reply.
    async fn chat(&self, turns: &[ChatTurn]) -> Result<String>;

    /// Name of the model requests are sent to
    fn model(&self) -> String;

    /// Base URL of the backend
    fn host(&self) -> String;
}
