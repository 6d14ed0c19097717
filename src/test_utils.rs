//! Test utilities for chatrelay
//!
//! This module provides common unit-test helpers: temporary databases,
//! a scripted inference provider, and assertion helpers.

use crate::error::{ChatError, Result};
use crate::providers::{ChatTurn, Provider};
use crate::storage::SqliteStorage;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a storage instance backed by a fresh temporary directory
///
/// The returned `TempDir` must be kept alive for as long as the storage is
/// used.
///
/// # Panics
///
/// Panics if the directory or database cannot be created
pub fn temp_storage() -> (SqliteStorage, TempDir) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let storage =
        SqliteStorage::new_with_path(dir.path().join("chat.db")).expect("Failed to open storage");
    (storage, dir)
}

/// Assert that an error carries the expected [`ChatError`] code and message
///
/// # Panics
///
/// Panics if the result is Ok, is not a `ChatError`, or does not match
pub fn assert_chat_error<T: std::fmt::Debug>(
    result: Result<T>,
    expected_code: &str,
    expected_message: &str,
) {
    let err = result.expect_err("Expected an error but got Ok");
    let chat_err = err
        .downcast_ref::<ChatError>()
        .unwrap_or_else(|| panic!("Error '{}' is not a ChatError", err));
    assert_eq!(chat_err.code(), expected_code);
    assert!(
        chat_err.to_string().contains(expected_message),
        "Error message '{}' does not contain '{}'",
        chat_err,
        expected_message
    );
}

/// Scripted provider that records every conversation it receives
#[derive(Clone, Default)]
pub struct MockProvider {
    reply: Option<String>,
    calls: Arc<Mutex<Vec<Vec<ChatTurn>>>>,
}

impl MockProvider {
    /// Provider that always answers with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Arc::default(),
        }
    }

    /// Provider that always fails as if the daemon were not running
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Conversations received so far, oldest first
    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn chat(&self, turns: &[ChatTurn]) -> Result<String> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(turns.to_vec());

        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(ChatError::InferenceConnection(
                ChatError::CONNECTION_MESSAGE.to_string(),
            )
            .into()),
        }
    }

    fn model(&self) -> String {
        "mock-model".to_string()
    }

    fn host(&self) -> String {
        "http://mock.invalid".to_string()
    }
}
