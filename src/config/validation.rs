//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{BridgeError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_storage_config(&settings.storage)?;
    validate_relay_config(&settings.relay)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(BridgeError::Config(
            "Bot token is required".to_string()
        ));
    }

    // The system must never come up without a bootstrap admin
    if config.admin_ids.is_empty() {
        return Err(BridgeError::Config(
            "At least one admin ID must be configured".to_string()
        ));
    }

    Ok(())
}

/// Validate identity store configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.snapshot_path.is_empty() {
        return Err(BridgeError::Config(
            "Storage snapshot path is required".to_string()
        ));
    }

    Ok(())
}

/// Validate relay configuration
fn validate_relay_config(config: &super::RelayConfig) -> Result<()> {
    if config.send_timeout_seconds == 0 {
        return Err(BridgeError::Config(
            "Send timeout must be greater than 0".to_string()
        ));
    }

    if config.queue_capacity == 0 {
        return Err(BridgeError::Config(
            "Queue capacity must be greater than 0".to_string()
        ));
    }

    if config.worker_idle_seconds == 0 {
        return Err(BridgeError::Config(
            "Worker idle timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(BridgeError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(BridgeError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
