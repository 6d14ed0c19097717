//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::providers::Provider;
use crate::service::{ConversationService, SessionService};
use crate::storage::SqliteStorage;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Conversation orchestration.
    pub conversations: ConversationService,
    /// Session CRUD.
    pub sessions: SessionService,
    /// Browser origin allowed by CORS.
    pub cors_origin: String,
}

impl AppState {
    pub fn new(storage: SqliteStorage, provider: Arc<dyn Provider>, server: &ServerConfig) -> Self {
        Self {
            conversations: ConversationService::new(storage.clone(), provider),
            sessions: SessionService::new(storage),
            cors_origin: server.cors_origin.clone(),
        }
    }
}
