//! Response envelope shared by every endpoint.

use axum::async_trait;
use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::convert::Infallible;

/// Successful response body.
///
/// ```json
/// {"success": true, "data": ..., "count": 2, "timestamp": "...", "path": "/api/messages"}
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
    pub path: String,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response carrying `data`.
    pub fn ok(path: RequestPath, data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
            timestamp: now_rfc3339(),
            path: path.0,
            status: StatusCode::OK,
        }
    }

    /// 201 response carrying the created resource.
    pub fn created(path: RequestPath, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(path, data)
        }
    }

    /// Attach an item count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// 200 response carrying only a human-readable message.
    pub fn message(path: RequestPath, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            count: None,
            message: Some(message.into()),
            timestamp: now_rfc3339(),
            path: path.0,
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Error body nested under `error`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Failed response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: String,
    pub path: String,
}

impl ErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code,
                message: message.into(),
            },
            timestamp: now_rfc3339(),
            path: path.into(),
        }
    }
}

/// Path of the current request as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestPath
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);
        Ok(Self(uri.path().to_string()))
    }
}

impl RequestPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
