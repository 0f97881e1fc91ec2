//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Bootstrap admins; seeded into the identity store on startup.
    pub admin_ids: Vec<i64>,
}

/// Identity store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path of the durable JSON snapshot file.
    pub snapshot_path: String,
}

/// Relay behaviour configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Bound on any single transport send; an elapsed timeout is treated
    /// as a delivery failure.
    pub send_timeout_seconds: u64,
    /// Capacity of each per-context inbound queue.
    pub queue_capacity: usize,
    /// Per-context workers idle longer than this are evicted.
    #[serde(default = "default_worker_idle_seconds")]
    pub worker_idle_seconds: u64,
}

fn default_worker_idle_seconds() -> u64 {
    300
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("CLIENTBRIDGE"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::BridgeError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_ids: vec![],
            },
            storage: StorageConfig {
                snapshot_path: "clientbridge.json".to_string(),
            },
            relay: RelayConfig {
                send_timeout_seconds: 10,
                queue_capacity: 64,
                worker_idle_seconds: 300,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/clientbridge".to_string(),
            },
        }
    }
}
