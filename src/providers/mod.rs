//! Provider module for chatrelay
//!
//! This module contains the inference provider abstraction and the Ollama
//! implementation.

pub mod base;
pub mod ollama;

pub use base::{ChatTurn, Provider, TurnRole};
pub use ollama::OllamaProvider;

use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;

/// Create the inference provider described by the configuration
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built
pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    Ok(Arc::new(OllamaProvider::new(config.ollama.clone())?))
}
