//! chatrelay - chat backend for a local Ollama daemon
//!
#![doc = "Main entry point for the chatrelay server and history tools."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatrelay::cli::{Cli, Commands};
use chatrelay::commands;
use chatrelay::config::Config;
use chatrelay::storage::SqliteStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let storage = SqliteStorage::from_config(&config.storage)?;
    tracing::debug!("Using database at {}", storage.db_path().display());

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting HTTP server");
            commands::run_server(config, storage).await?;
            Ok(())
        }
        Commands::History { command } => {
            commands::handle_history(command, &storage)?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_directives = if verbose {
        "chatrelay=debug,tower_http=debug"
    } else {
        "chatrelay=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
