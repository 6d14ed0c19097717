//! HTTP request handlers.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::Method;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult, ResultExt};
use super::response::{ApiResponse, RequestPath};
use super::state::AppState;
use crate::error::ChatError;
use crate::storage::{Message, Session};

/// Body of `POST /api/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Optional session filter for message listing and clearing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub session_id: Option<String>,
}

impl MessageQuery {
    /// Session filter, treating an empty `sessionId=` as no filter
    pub fn scope(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Body of `POST /api/sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Body of `PUT /api/sessions/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub title: Option<Value>,
}

/// Health payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub model: String,
    pub ollama_host: String,
}

/// Liveness probe.
pub async fn health(State(state): State<AppState>, path: RequestPath) -> ApiResponse<HealthStatus> {
    let status = HealthStatus {
        status: "ok",
        model: state.conversations.model(),
        ollama_host: state.conversations.provider_host(),
    };
    ApiResponse::ok(path, status).with_message("Server is running")
}

/// Send a user message and return the assistant's reply.
pub async fn send_message(
    State(state): State<AppState>,
    path: RequestPath,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Message>> {
    let Json(body) = body.map_err(|rejection| ApiError::from_json_rejection(rejection, &path))?;

    let content = match body.content {
        None | Some(Value::Null) => {
            return Err(ApiError::new(
                ChatError::Validation("Message content is required".to_string()),
                &path,
            ))
        }
        Some(Value::String(content)) => content,
        Some(_) => {
            return Err(ApiError::new(
                ChatError::Validation("Message content must be a string".to_string()),
                &path,
            ))
        }
    };

    let reply = state
        .conversations
        .send_message(&content, body.session_id.as_deref())
        .await
        .at(&path)?;

    Ok(ApiResponse::ok(path, reply))
}

/// List stored messages.
pub async fn list_messages(
    State(state): State<AppState>,
    path: RequestPath,
    query: Result<Query<MessageQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Message>>> {
    let Query(query) =
        query.map_err(|rejection| ApiError::from_query_rejection(rejection, &path))?;
    let messages = state
        .conversations
        .list_messages(query.scope())
        .await
        .at(&path)?;
    let count = messages.len();
    Ok(ApiResponse::ok(path, messages).with_count(count))
}

/// Delete stored messages.
pub async fn clear_messages(
    State(state): State<AppState>,
    path: RequestPath,
    query: Result<Query<MessageQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<()>> {
    let Query(query) =
        query.map_err(|rejection| ApiError::from_query_rejection(rejection, &path))?;
    let scope = query.scope();
    state.conversations.clear_messages(scope).await.at(&path)?;

    let message = match scope {
        Some(_) => "Session messages cleared successfully",
        None => "All messages cleared successfully",
    };
    Ok(ApiResponse::message(path, message))
}

/// Create a session. The body and its title are optional.
pub async fn create_session(
    State(state): State<AppState>,
    path: RequestPath,
    body: Bytes,
) -> ApiResult<ApiResponse<Session>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice::<CreateSessionRequest>(&body).map_err(|e| {
            ApiError::new(
                ChatError::InvalidInput(format!("Failed to parse the request body as JSON: {}", e)),
                &path,
            )
        })?
    };

    let session = state
        .sessions
        .create(request.title.as_deref())
        .await
        .at(&path)?;
    Ok(ApiResponse::created(path, session))
}

/// List sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<AppState>,
    path: RequestPath,
) -> ApiResult<ApiResponse<Vec<Session>>> {
    let sessions = state.sessions.list().await.at(&path)?;
    let count = sessions.len();
    Ok(ApiResponse::ok(path, sessions).with_count(count))
}

/// Fetch one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    path: RequestPath,
) -> ApiResult<ApiResponse<Session>> {
    match state.sessions.get(&session_id).await.at(&path)? {
        Some(session) => Ok(ApiResponse::ok(path, session)),
        None => Err(ApiError::new(
            ChatError::NotFound("Session not found".to_string()),
            &path,
        )),
    }
}

/// Rename a session.
pub async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    path: RequestPath,
    body: Result<Json<UpdateSessionRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Session>> {
    let Json(body) = body.map_err(|rejection| ApiError::from_json_rejection(rejection, &path))?;

    let Some(Value::String(title)) = body.title else {
        return Err(ApiError::new(
            ChatError::Validation("Title is required and must be a string".to_string()),
            &path,
        ));
    };

    let session = state
        .sessions
        .rename(&session_id, &title)
        .await
        .at(&path)?;
    Ok(ApiResponse::ok(path, session))
}

/// Delete a session and its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    path: RequestPath,
) -> ApiResult<ApiResponse<()>> {
    state.sessions.delete(&session_id).await.at(&path)?;
    Ok(ApiResponse::message(path, "Session deleted successfully"))
}

/// Envelope for paths no route matches.
pub async fn not_found(path: RequestPath) -> ApiError {
    let message = format!("Route {} not found", path.as_str());
    ApiError::new(ChatError::NotFound(message), &path)
}

/// Envelope for known paths hit with an unsupported method.
pub async fn method_not_allowed(method: Method, path: RequestPath) -> ApiError {
    let message = format!("Method {} not allowed on {}", method, path.as_str());
    ApiError::new(ChatError::MethodNotAllowed(message), &path)
}
