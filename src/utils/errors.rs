//! Error handling for ClientBridge
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

use crate::models::client::ClientStatus;

/// Main error type for ClientBridge application
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Unknown client: {client_id}")]
    UnknownClient { client_id: i64 },

    #[error("Unknown group: {group_id}")]
    UnknownGroup { group_id: i64 },

    #[error("Stale state for client {client_id}: expected {expected}, found {actual}")]
    StaleState {
        client_id: i64,
        expected: &'static str,
        actual: ClientStatus,
    },

    #[error("Delivery to chat {chat_id} failed: {reason}")]
    DeliveryFailed { chat_id: i64, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for ClientBridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            BridgeError::Telegram(_) => true,
            BridgeError::Config(_) => false,
            BridgeError::NotAuthorized(_) => false,
            BridgeError::UnknownClient { .. } => false,
            BridgeError::UnknownGroup { .. } => false,
            BridgeError::StaleState { .. } => true,
            BridgeError::DeliveryFailed { .. } => true,
            BridgeError::Serialization(_) => false,
            BridgeError::Io(_) => true,
            BridgeError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BridgeError::Config(_) => ErrorSeverity::Critical,
            BridgeError::Io(_) => ErrorSeverity::Critical,
            BridgeError::Serialization(_) => ErrorSeverity::Critical,
            BridgeError::NotAuthorized(_) => ErrorSeverity::Warning,
            BridgeError::StaleState { .. } => ErrorSeverity::Warning,
            BridgeError::DeliveryFailed { .. } => ErrorSeverity::Warning,
            BridgeError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
