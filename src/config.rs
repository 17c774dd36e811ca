//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub content: ContentConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Allowed CORS origin; permissive when unset
    pub cors_origin: Option<String>,
    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
    /// Connection pool size
    pub max_connections: u32,
    /// Deadline for a single core operation, in milliseconds
    pub operation_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Actor identity verification
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the identity provider (32+ bytes)
    pub token_secret: String,
    /// Token max age in seconds (default: 86400)
    pub token_max_age: i64,
}

/// List endpoint defaults
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    /// Page size when the client sends none (default: 5)
    pub default_limit: u32,
    /// Upper bound for client-supplied page size (default: 100)
    pub max_limit: u32,
}

/// Content lifecycle policy
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Remove likes, comments and playlist entries of deleted content
    pub cascade_deletes: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (VIDTUBE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.body_limit_bytes", 16 * 1024)?
            .set_default("database.path", "data/vidtube.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.operation_timeout_ms", 5000)?
            .set_default("auth.token_max_age", 86400)?
            .set_default("pagination.default_limit", 5)?
            .set_default("pagination.max_limit", 100)?
            .set_default("content.cascade_deletes", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("VIDTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_TOKEN_SECRET_BYTES: usize = 32;

        if self.auth.token_secret.len() < MIN_TOKEN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.token_secret must be at least {} bytes",
                MIN_TOKEN_SECRET_BYTES
            )));
        }

        if self.auth.token_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.token_max_age must be greater than 0".to_string(),
            ));
        }

        if self.database.operation_timeout_ms == 0 {
            return Err(crate::error::AppError::Config(
                "database.operation_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            return Err(crate::error::AppError::Config(
                "pagination.default_limit must be between 1 and pagination.max_limit".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origin: None,
                body_limit_bytes: 16 * 1024,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/vidtube-test.db"),
                max_connections: 5,
                operation_timeout_ms: 5000,
            },
            auth: AuthConfig {
                token_secret: "x".repeat(32),
                token_max_age: 86_400,
            },
            pagination: PaginationConfig {
                default_limit: 5,
                max_limit: 100,
            },
            content: ContentConfig {
                cascade_deletes: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.database.operation_timeout(),
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn validate_rejects_short_token_secret() {
        let mut config = valid_config();
        config.auth.token_secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("token secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.token_secret")
        ));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.database.operation_timeout_ms = 0;

        assert!(matches!(
            config.validate(),
            Err(crate::error::AppError::Config(message))
                if message.contains("operation_timeout_ms")
        ));
    }

    #[test]
    fn validate_rejects_default_limit_above_max() {
        let mut config = valid_config();
        config.pagination.default_limit = 500;

        assert!(matches!(
            config.validate(),
            Err(crate::error::AppError::Config(message))
                if message.contains("pagination.default_limit")
        ));
    }
}
