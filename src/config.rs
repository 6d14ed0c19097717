//! Configuration management for chatrelay
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for chatrelay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Inference daemon settings
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Conversation storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Browser origin allowed by CORS
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Timeout for a single chat request (seconds)
    #[serde(default = "default_ollama_timeout")]
    pub timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_ollama_timeout() -> u64 {
    300
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            timeout_seconds: default_ollama_timeout(),
        }
    }
}

/// Conversation storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database; the platform data directory is used when unset
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("CHATRELAY_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("CHATRELAY_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid CHATRELAY_PORT: {}", port);
            }
        }

        if let Ok(origin) = std::env::var("CHATRELAY_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }

        if let Ok(ollama_host) = std::env::var("CHATRELAY_OLLAMA_HOST") {
            self.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("CHATRELAY_OLLAMA_MODEL") {
            self.ollama.model = ollama_model;
        }

        if let Ok(timeout) = std::env::var("CHATRELAY_OLLAMA_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.ollama.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CHATRELAY_OLLAMA_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(db_path) = std::env::var("CHATRELAY_DB_PATH") {
            tracing::debug!(db_path = %db_path, "Env override: CHATRELAY_DB_PATH");
            self.storage.db_path = Some(db_path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(db_path) = &cli.storage_path {
            self.storage.db_path = Some(db_path.clone());
        }

        if let crate::cli::Commands::Serve { host, port } = &cli.command {
            if let Some(host) = host {
                self.server.host = host.clone();
            }
            if let Some(port) = port {
                self.server.port = *port;
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ChatError::Config("server.port must be greater than 0".to_string()).into());
        }

        if self.server.host.trim().is_empty() {
            return Err(ChatError::Config("server.host cannot be empty".to_string()).into());
        }

        if self.ollama.model.trim().is_empty() {
            return Err(ChatError::Config("ollama.model cannot be empty".to_string()).into());
        }

        if !(self.ollama.host.starts_with("http://") || self.ollama.host.starts_with("https://")) {
            return Err(ChatError::Config(format!(
                "Invalid ollama.host: {}. Must start with http:// or https://",
                self.ollama.host
            ))
            .into());
        }

        if self.ollama.timeout_seconds == 0 {
            return Err(ChatError::Config(
                "ollama.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
