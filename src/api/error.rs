//! Mapping of service failures onto error envelopes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use super::response::{ErrorResponse, RequestPath};
use crate::error::ChatError;

/// Generic message returned for unclassified failures.
const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// API error bound to the request path it occurred on.
#[derive(Debug)]
pub struct ApiError {
    error: ChatError,
    path: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(error: ChatError, path: &RequestPath) -> Self {
        Self {
            error,
            path: path.as_str().to_string(),
        }
    }

    /// Recover the typed error from an anyhow chain, or fall back to an
    /// internal error.
    pub fn from_anyhow(err: anyhow::Error, path: &RequestPath) -> Self {
        match err.downcast::<ChatError>() {
            Ok(chat_err) => Self::new(chat_err, path),
            Err(other) => Self::new(ChatError::Internal(format!("{:#}", other)), path),
        }
    }

    pub fn from_json_rejection(rejection: JsonRejection, path: &RequestPath) -> Self {
        Self::new(ChatError::InvalidInput(rejection.body_text()), path)
    }

    pub fn from_query_rejection(rejection: QueryRejection, path: &RequestPath) -> Self {
        Self::new(ChatError::InvalidInput(rejection.body_text()), path)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn error_code(&self) -> &'static str {
        self.error.code()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let detail = self.error.to_string();

        let message = match &self.error {
            ChatError::Internal(_) | ChatError::Config(_) => {
                error!(error_code = code, path = %self.path, message = %detail, "Unhandled error");
                INTERNAL_MESSAGE.to_string()
            }
            _ if status.is_server_error() => {
                if self.error.is_inference() {
                    warn!(error_code = code, path = %self.path, message = %detail, "Inference error");
                } else {
                    error!(error_code = code, path = %self.path, message = %detail, "API error");
                }
                detail
            }
            _ => {
                tracing::debug!(error_code = code, path = %self.path, message = %detail, "Client error");
                detail
            }
        };

        let body = ErrorResponse::new(code, message, self.path);
        (status, Json(body)).into_response()
    }
}

/// Attach the request path to a fallible service call.
pub trait ResultExt<T> {
    fn at(self, path: &RequestPath) -> ApiResult<T>;
}

impl<T> ResultExt<T> for anyhow::Result<T> {
    fn at(self, path: &RequestPath) -> ApiResult<T> {
        self.map_err(|e| ApiError::from_anyhow(e, path))
    }
}
