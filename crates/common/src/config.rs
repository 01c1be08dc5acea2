//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Real-time streaming configuration.
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Notification retention configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Real-time streaming configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    /// Per-room broadcast channel capacity.
    #[serde(default = "default_room_capacity")]
    pub room_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            room_capacity: default_room_capacity(),
        }
    }
}

/// Notification retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Seconds a notification is kept before the sweeper removes it.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// Seconds between retention sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_room_capacity() -> usize {
    1000
}

const fn default_retention_secs() -> u64 {
    // 30 days
    30 * 24 * 60 * 60
}

const fn default_sweep_interval_secs() -> u64 {
    60 * 10
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CLIPSTREAM_ENV`)
    /// 3. Environment variables with `CLIPSTREAM` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("CLIPSTREAM_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CLIPSTREAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CLIPSTREAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(default_port(), 3000);
        assert_eq!(default_max_connections(), 100);
        assert_eq!(StreamingConfig::default().room_capacity, 1000);
        assert_eq!(NotificationConfig::default().retention_secs, 2_592_000);
    }
}
