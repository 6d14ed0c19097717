//! Command-line interface definition for chatrelay
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to run the HTTP server and inspect stored history.

use clap::{Parser, Subcommand};

/// chatrelay - chat backend for a local Ollama daemon
///
/// Persists conversations and sessions, and relays each conversation
/// to the inference daemon.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatrelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the conversation database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for chatrelay
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inspect stored chat sessions
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List stored sessions, most recently updated first
    List,

    /// Print every message of a session
    Show {
        /// Session identifier
        id: String,
    },

    /// Delete a session and all of its messages
    Delete {
        /// Session identifier
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
