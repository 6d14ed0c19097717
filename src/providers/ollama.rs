//! Ollama provider implementation for chatrelay
//!
//! This module implements the Provider trait for Ollama, sending the whole
//! conversation to a local or remote Ollama server in one non-streaming
//! `/api/chat` request and translating transport and HTTP failures into
//! [`ChatError`] values.

use crate::config::OllamaConfig;
use crate::error::{ChatError, Result};
use crate::providers::{ChatTurn, Provider};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use chatrelay::config::OllamaConfig;
/// use chatrelay::providers::{ChatTurn, OllamaProvider, Provider};
///
/// # async fn example() -> chatrelay::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let reply = provider.chat(&[ChatTurn::user("Hello!")]).await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
}

/// Response structure from Ollama API
///
/// Both fields are optional so an incomplete reply can be reported as such
/// instead of as a decode failure.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::config::OllamaConfig;
    /// use chatrelay::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chatrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}, timeout={}s",
            config.host,
            config.model,
            config.timeout_seconds
        );

        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.host.trim_end_matches('/'))
    }
}

/// Map a transport-level failure onto the error taxonomy
fn classify_transport_error(err: &reqwest::Error) -> ChatError {
    if err.is_timeout() {
        ChatError::InferenceTimeout(ChatError::TIMEOUT_MESSAGE.to_string())
    } else if err.is_connect() {
        ChatError::InferenceConnection(ChatError::CONNECTION_MESSAGE.to_string())
    } else if err.is_decode() {
        ChatError::InferenceUnexpected(err.to_string())
    } else {
        ChatError::Upstream {
            status: 503,
            message: format!("Network error: {}", err),
        }
    }
}

/// Map a non-success HTTP status onto the error taxonomy
fn classify_status(status: StatusCode, model: &str) -> ChatError {
    if status == StatusCode::NOT_FOUND {
        return ChatError::ModelNotFound {
            model: model.to_string(),
        };
    }

    let code = status.as_u16();
    ChatError::Upstream {
        status: if code >= 500 { 502 } else { code },
        message: format!("Ollama API returned {}", status),
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(&self, turns: &[ChatTurn]) -> Result<String> {
        let request = OllamaRequest {
            model: &self.config.model,
            messages: turns,
            stream: false,
        };

        tracing::debug!(
            "Sending Ollama request: {} messages, model={}",
            turns.len(),
            self.config.model
        );

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Ollama request failed: {}", e);
                classify_transport_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Ollama returned error {}: {}", status, error_text);
            return Err(classify_status(status, &self.config.model).into());
        }

        let reply: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            classify_transport_error(&e)
        })?;

        match reply {
            OllamaResponse {
                message: Some(message),
                done: Some(true),
            } => {
                tracing::debug!("Ollama reply: {} chars", message.content.chars().count());
                Ok(message.content)
            }
            _ => Err(ChatError::Upstream {
                status: 502,
                message: "Invalid response from Ollama: response is not complete".to_string(),
            }
            .into()),
        }
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }

    fn host(&self) -> String {
        self.config.host.clone()
    }
}
