//! chatrelay - chat backend for a local Ollama daemon
//!
//! This library provides the pieces of a small chat backend: conversation
//! and session persistence, the inference client, the conversation
//! orchestration, and the HTTP API a browser frontend talks to.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: SQLite-backed message and session stores
//! - `providers`: Inference provider abstraction and the Ollama client
//! - `service`: Conversation orchestration and session management
//! - `api`: axum router, handlers and the JSON response envelope
//! - `commands`: CLI command handlers (`serve`, `history`)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatrelay::api::{create_router, AppState};
//! use chatrelay::config::Config;
//! use chatrelay::providers::create_provider;
//! use chatrelay::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let storage = SqliteStorage::from_config(&config.storage)?;
//!     let state = AppState::new(storage, create_provider(&config)?, &config.server);
//!     let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//!     axum::serve(listener, create_router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatError, Result};
pub use service::{ConversationService, SessionService};
pub use storage::SqliteStorage;

#[cfg(test)]
pub mod test_utils;
