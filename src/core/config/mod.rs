//! Layered configuration for the task server.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`DATABASE_URL`, `HOST`, `PORT`, `DB_POOL_SIZE`)
//! 2. `taskserver.toml` in the working directory
//! 3. Built-in defaults (local `task.db` file, `127.0.0.1:8000`)

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "taskserver.toml";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///./task.db";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            db_pool_size: 8,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from every source.
    ///
    /// Does not read `.env`; the binary calls `dotenvy` before this.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let local_path = PathBuf::from(CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::raw().only(&["database_url", "host", "port", "db_pool_size"]))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.db_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "db_pool_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
