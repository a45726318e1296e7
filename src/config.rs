//! # Configuration
//!
//! Application configuration loading and management.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override earlier):
//! 1. Default values
//! 2. Configuration file (if exists)
//! 3. Environment variables (prefixed with `TRADE_KERNEL_`)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TRADE_KERNEL_REST_HOST` | REST server host | `0.0.0.0` |
//! | `TRADE_KERNEL_REST_PORT` | REST server port | `8080` |
//! | `TRADE_KERNEL_DATABASE_URL` | PostgreSQL URL (unset = in-memory) | *(unset)* |
//! | `TRADE_KERNEL_COMPLIANCE_URL` | Compliance service base URL | *(unset)* |
//! | `TRADE_KERNEL_CUSTODIAN_URL` | Escrow custodian base URL | *(unset)* |
//! | `TRADE_KERNEL_COLLABORATOR_TIMEOUT_MS` | Collaborator call timeout | `2000` |
//! | `TRADE_KERNEL_LOG_LEVEL` | Log level | `info` |
//!
//! # Examples
//!
//! ```ignore
//! use trade_kernel::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("REST server: {}", config.rest.socket_addr()?);
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

/// REST/HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Server host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_rest_port")]
    pub port: u16,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_rest_port(),
        }
    }
}

impl RestConfig {
    /// Returns the socket address for the REST server.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                field: "rest.host:port".to_string(),
                message: format!("{e}"),
            })
    }
}

/// Database configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. When unset, the in-memory store is
    /// used.
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum pool connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// External collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    /// Compliance service base URL. When unset, an empty static provider
    /// is used (every lookup fails closed).
    #[serde(default)]
    pub compliance_url: Option<String>,

    /// Escrow custodian base URL. When unset, the in-memory custodian is
    /// used.
    #[serde(default)]
    pub custodian_url: Option<String>,

    /// Bounded timeout on every collaborator call, in milliseconds.
    #[serde(default = "default_collaborator_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            compliance_url: None,
            custodian_url: None,
            timeout_ms: default_collaborator_timeout_ms(),
        }
    }
}

impl CollaboratorConfig {
    /// Returns the collaborator call timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST server settings.
    #[serde(default)]
    pub rest: RestConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Collaborator settings.
    #[serde(default)]
    pub collaborators: CollaboratorConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads configuration from defaults, an optional `trade-kernel.toml`
    /// next to the binary, and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if an override value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file_or_default(Path::new("trade-kernel.toml"))?;
        config.apply_env()?;
        Ok(config)
    }

    /// Loads configuration from a file, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("TRADE_KERNEL_REST_HOST") {
            self.rest.host = host;
        }
        if let Ok(port) = std::env::var("TRADE_KERNEL_REST_PORT") {
            self.rest.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "rest.port".to_string(),
                message: format!("not a port number: {port}"),
            })?;
        }
        if let Ok(url) = std::env::var("TRADE_KERNEL_DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(url) = std::env::var("TRADE_KERNEL_COMPLIANCE_URL") {
            self.collaborators.compliance_url = Some(url);
        }
        if let Ok(url) = std::env::var("TRADE_KERNEL_CUSTODIAN_URL") {
            self.collaborators.custodian_url = Some(url);
        }
        if let Ok(timeout) = std::env::var("TRADE_KERNEL_COLLABORATOR_TIMEOUT_MS") {
            self.collaborators.timeout_ms =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "collaborators.timeout_ms".to_string(),
                    message: format!("not a duration in ms: {timeout}"),
                })?;
        }
        if let Ok(level) = std::env::var("TRADE_KERNEL_LOG_LEVEL") {
            self.log.level = level;
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_rest_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_collaborator_timeout_ms() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "info".to_string()
}
