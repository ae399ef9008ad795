//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

use carniceria_core::{DEFAULT_CLOSINGS_LIMIT, DEFAULT_HISTORY_LIMIT};

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface the HTTP server binds to
    pub http_host: String,

    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub db_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Cap on `GET /pedidos/historial`
    pub history_limit: i64,

    /// Cap on `GET /admin/cierres`
    pub closings_limit: i64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),

            http_port: parse_var("HTTP_PORT", "5000")?,

            db_path: env::var("DB_PATH").unwrap_or_else(|_| "carniceria_db.sqlite".to_string()),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // In production, this MUST be set via environment variable
                "carniceria-dev-secret-change-in-production".to_string()
            }),

            jwt_lifetime_secs: parse_var("JWT_LIFETIME_SECS", "43200")?, // 12 hours

            history_limit: parse_var("HISTORY_LIMIT", &DEFAULT_HISTORY_LIMIT.to_string())?,

            closings_limit: parse_var("CLOSINGS_LIMIT", &DEFAULT_CLOSINGS_LIMIT.to_string())?,
        };

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Address to bind the listener to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.http_host, self.http_port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HTTP_HOST".to_string()))
    }
}

impl Default for ApiConfig {
    /// Development defaults, identical to `load()` with an empty environment.
    fn default() -> Self {
        ApiConfig {
            http_host: "127.0.0.1".to_string(),
            http_port: 5000,
            db_path: "carniceria_db.sqlite".to_string(),
            db_max_connections: 5,
            jwt_secret: "carniceria-dev-secret-change-in-production".to_string(),
            jwt_lifetime_secs: 43200,
            history_limit: DEFAULT_HISTORY_LIMIT,
            closings_limit: DEFAULT_CLOSINGS_LIMIT,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
