//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CLINIC_QUEUE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use clinic_queue::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod auth;
mod database;
mod error;
mod queue;
mod server;

pub use auth::{AuthConfig, MIN_PRODUCTION_SECRET_LEN};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use queue::QueueConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection; in-memory storage when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Access token verification
    pub auth: AuthConfig,

    /// Sequencer and broadcast timeouts
    #[serde(default)]
    pub queue: QueueConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CLINIC_QUEUE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CLINIC_QUEUE__SERVER__PORT=8000` -> `server.port = 8000`
    /// - `CLINIC_QUEUE__DATABASE__URL=...` -> `database.url = ...`
    /// - `CLINIC_QUEUE__AUTH__JWT_SECRET=...` -> `auth.jwt_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CLINIC_QUEUE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.auth.validate(&self.server.environment)?;
        self.queue.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "CLINIC_QUEUE__AUTH__JWT_SECRET",
        "CLINIC_QUEUE__DATABASE__URL",
        "CLINIC_QUEUE__SERVER__PORT",
        "CLINIC_QUEUE__SERVER__ENVIRONMENT",
        "CLINIC_QUEUE__QUEUE__SEQUENCER_ACQUIRE_TIMEOUT_MS",
        "CLINIC_QUEUE__QUEUE__BROADCAST_SEND_TIMEOUT_MS",
    ];

    fn set_minimal_env() {
        env::set_var("CLINIC_QUEUE__AUTH__JWT_SECRET", "test-secret");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        set_minimal_env();
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.auth.jwt_secret.expose_secret(), "test-secret");
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.queue, QueueConfig::default());
    }

    #[test]
    fn test_database_section_is_optional() {
        let config = load_with(&[("CLINIC_QUEUE__DATABASE__URL", "postgres://localhost/clinic")])
            .unwrap();
        let database = config.database.unwrap();
        assert_eq!(database.url.expose_secret(), "postgres://localhost/clinic");
    }

    #[test]
    fn test_queue_overrides() {
        let config = load_with(&[
            ("CLINIC_QUEUE__QUEUE__SEQUENCER_ACQUIRE_TIMEOUT_MS", "500"),
            ("CLINIC_QUEUE__QUEUE__BROADCAST_SEND_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.queue.sequencer_acquire_timeout_ms, 500);
        assert_eq!(config.queue.broadcast_send_timeout_ms, 250);
    }

    #[test]
    fn test_is_production() {
        let config = load_with(&[("CLINIC_QUEUE__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
        // the short test secret is not acceptable in production
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_server_port() {
        let config = load_with(&[("CLINIC_QUEUE__SERVER__PORT", "3000")]).unwrap();
        assert_eq!(config.server.port, 3000);
    }
}
