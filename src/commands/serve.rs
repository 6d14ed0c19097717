//! HTTP server command

use anyhow::Context;
use tokio::net::TcpListener;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::error::Result;
use crate::providers::create_provider;
use crate::storage::SqliteStorage;

/// Run the HTTP API until Ctrl-C or SIGTERM
pub async fn run_server(config: Config, storage: SqliteStorage) -> Result<()> {
    let provider = create_provider(&config)?;
    let state = AppState::new(storage, provider, &config.server);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(
        "Server listening on http://{} (model={}, ollama={})",
        address,
        config.ollama.model,
        config.ollama.host
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
