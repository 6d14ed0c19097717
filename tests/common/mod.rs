use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use chatrelay::api::{create_router, AppState};
use chatrelay::config::{Config, OllamaConfig};
use chatrelay::providers::{OllamaProvider, Provider};
use chatrelay::storage::SqliteStorage;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("chat.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Ollama settings pointing at `host`
#[allow(dead_code)]
pub fn ollama_config(host: &str, timeout_seconds: u64) -> OllamaConfig {
    OllamaConfig {
        host: host.to_string(),
        model: "llama3".to_string(),
        timeout_seconds,
    }
}

/// Router backed by a temp database and a real Ollama client aimed at `ollama_host`
#[allow(dead_code)]
pub fn create_app(ollama_host: &str) -> (Router, SqliteStorage, TempDir) {
    let (storage, tmp) = create_temp_storage();
    let provider: Arc<dyn Provider> = Arc::new(
        OllamaProvider::new(ollama_config(ollama_host, 5)).expect("failed to create provider"),
    );
    let state = AppState::new(storage.clone(), provider, &Config::default().server);
    (create_router(state), storage, tmp)
}

/// Send one request through the router and decode the JSON envelope
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("failed to build request"))
        .await
        .expect("router failed");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
