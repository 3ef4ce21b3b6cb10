//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::phone::DEFAULT_COUNTRY_PREFIX;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cdr: CdrConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum JSON payload in bytes (uploaded batches can be large)
    #[serde(default = "default_payload_limit")]
    pub payload_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9001
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_payload_limit() -> usize {
    10 * 1024 * 1024
}

/// Application database configuration (contact batches)
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply embedded migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

/// Asterisk CDR source configuration
///
/// When `url` is unset the call log is read through the application pool.
#[derive(Debug, Deserialize, Clone)]
pub struct CdrConfig {
    /// Separate connection URL for the CDR database
    pub url: Option<String>,

    /// CDR table name
    #[serde(default = "default_cdr_table")]
    pub table: String,

    /// Maximum number of connections when a separate pool is used
    #[serde(default = "default_cdr_connections")]
    pub max_connections: u32,
}

fn default_cdr_table() -> String {
    "cdr".to_string()
}

fn default_cdr_connections() -> u32 {
    5
}

impl Default for CdrConfig {
    fn default() -> Self {
        Self {
            url: None,
            table: default_cdr_table(),
            max_connections: default_cdr_connections(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret shared with the issuing service
    pub jwt_secret: String,

    /// JWT token expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: i64,
}

fn default_jwt_expiration() -> i64 {
    1800
}

/// Reconciliation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReconciliationConfig {
    /// Country calling code added to or stripped from local numbers
    #[serde(default = "default_country_prefix")]
    pub country_prefix: String,
}

fn default_country_prefix() -> String {
    DEFAULT_COUNTRY_PREFIX.to_string()
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            country_prefix: default_country_prefix(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Comma separated list of allowed origins
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

fn default_cors_origins() -> String {
    "http://localhost:3000,http://127.0.0.1:3000".to_string()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

impl CorsConfig {
    /// Allowed origins, trimmed, empty entries dropped
    pub fn origin_list(&self) -> Vec<String> {
        self.origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 9001)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.run_migrations", false)?
            .set_default("cdr.table", "cdr")?
            .set_default("cdr.max_connections", 5)?
            .set_default("auth.jwt_expiration_secs", 1800)?
            .set_default("reconciliation.country_prefix", DEFAULT_COUNTRY_PREFIX)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with CALLMATCH_ prefix
            .add_source(
                Environment::with_prefix("CALLMATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
