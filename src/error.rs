//! Error types for chatrelay
//!
//! This module defines the closed set of failures the backend can report,
//! using `thiserror` for ergonomic error handling. Every variant knows the
//! HTTP status and envelope code it maps to.

use thiserror::Error;

/// Main error type for chatrelay operations
///
/// Covers request validation, inference daemon failures, persistence
/// failures, and configuration problems.
#[derive(Error, Debug)]
pub enum ChatError {
    /// User input failed validation (empty, too long, missing fields)
    #[error("{0}")]
    Validation(String),

    /// Request body could not be decoded
    #[error("{0}")]
    InvalidInput(String),

    /// Requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Inference daemon refused the connection or is not running
    #[error("{0}")]
    InferenceConnection(String),

    /// Inference request exceeded the configured timeout
    #[error("{0}")]
    InferenceTimeout(String),

    /// Inference daemon does not have the configured model
    #[error("Model \"{model}\" not found. Please pull the model first using: ollama pull {model}")]
    ModelNotFound {
        /// Model name that was requested
        model: String,
    },

    /// Inference daemon answered with an error or an incomplete reply
    #[error("{message}")]
    Upstream {
        /// HTTP status reported to the caller
        status: u16,
        /// Description of the upstream failure
        message: String,
    },

    /// Inference call failed in a way that could not be classified
    #[error("Unexpected error: {0}")]
    InferenceUnexpected(String),

    /// Conversation storage errors (database operations)
    #[error("{0}")]
    Persistence(String),

    /// Known path, unsupported HTTP method
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl ChatError {
    /// Default message when the inference daemon is unreachable
    pub const CONNECTION_MESSAGE: &'static str =
        "Ollama service is not running. Please start Ollama first.";

    /// Default message when the inference request times out
    pub const TIMEOUT_MESSAGE: &'static str =
        "Ollama request timed out. The model may be processing a large request. Please try again.";

    /// HTTP status code for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::error::ChatError;
    ///
    /// let err = ChatError::Validation("Message content cannot be empty".to_string());
    /// assert_eq!(err.status_code(), 400);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidInput(_) => 400,
            Self::NotFound(_) | Self::ModelNotFound { .. } => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::InferenceConnection(_) => 503,
            Self::InferenceTimeout(_) => 504,
            Self::Upstream { status, .. } => *status,
            Self::InferenceUnexpected(_) => 502,
            Self::Persistence(_) | Self::Config(_) | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable code used in the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::InferenceConnection(_) => "OLLAMA_CONNECTION_ERROR",
            Self::InferenceTimeout(_) => "OLLAMA_TIMEOUT",
            Self::ModelNotFound { .. } => "OLLAMA_MODEL_NOT_FOUND",
            Self::Upstream { .. } | Self::InferenceUnexpected(_) => "OLLAMA_SERVICE_ERROR",
            Self::Persistence(_) => "DATABASE_ERROR",
            Self::Config(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure originated at the inference daemon
    pub fn is_inference(&self) -> bool {
        matches!(
            self,
            Self::InferenceConnection(_)
                | Self::InferenceTimeout(_)
                | Self::ModelNotFound { .. }
                | Self::Upstream { .. }
                | Self::InferenceUnexpected(_)
        )
    }
}

/// Result type alias for chatrelay operations
///
/// Uses `anyhow::Error` so callers can attach context; the HTTP layer
/// downcasts back to [`ChatError`] to pick a status code.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = ChatError::Validation("Message content cannot be empty".to_string());
        assert_eq!(error.to_string(), "Message content cannot be empty");
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_model_not_found_display() {
        let error = ChatError::ModelNotFound {
            model: "llama3".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Model \"llama3\" not found. Please pull the model first using: ollama pull llama3"
        );
        assert_eq!(error.status_code(), 404);
        assert_eq!(error.code(), "OLLAMA_MODEL_NOT_FOUND");
    }

    #[test]
    fn test_inference_status_codes() {
        let conn = ChatError::InferenceConnection(ChatError::CONNECTION_MESSAGE.to_string());
        assert_eq!(conn.status_code(), 503);
        assert_eq!(conn.code(), "OLLAMA_CONNECTION_ERROR");

        let timeout = ChatError::InferenceTimeout(ChatError::TIMEOUT_MESSAGE.to_string());
        assert_eq!(timeout.status_code(), 504);
        assert_eq!(timeout.code(), "OLLAMA_TIMEOUT");

        let unexpected = ChatError::InferenceUnexpected("boom".to_string());
        assert_eq!(unexpected.status_code(), 502);
        assert_eq!(unexpected.to_string(), "Unexpected error: boom");
    }

    #[test]
    fn test_upstream_mirrors_status() {
        let error = ChatError::Upstream {
            status: 429,
            message: "Ollama API returned 429 Too Many Requests".to_string(),
        };
        assert_eq!(error.status_code(), 429);
        assert_eq!(error.code(), "OLLAMA_SERVICE_ERROR");
        assert!(error.is_inference());
    }

    #[test]
    fn test_persistence_error() {
        let error = ChatError::Persistence("Failed to fetch messages: disk full".to_string());
        assert_eq!(error.status_code(), 500);
        assert_eq!(error.code(), "DATABASE_ERROR");
        assert!(!error.is_inference());
    }

    #[test]
    fn test_method_not_allowed_error() {
        let error = ChatError::MethodNotAllowed("Method PATCH not allowed".to_string());
        assert_eq!(error.status_code(), 405);
        assert_eq!(error.code(), "METHOD_NOT_ALLOWED");
        assert!(!error.is_inference());
    }

    #[test]
    fn test_config_error_display() {
        let error = ChatError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
        assert_eq!(error.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = ChatError::NotFound("Session not found".to_string()).into();
        let chat = err.downcast_ref::<ChatError>().expect("downcast");
        assert_eq!(chat.status_code(), 404);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatError>();
    }
}
