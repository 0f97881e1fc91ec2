//! ClientBridge Telegram Bot
//!
//! A message-relay service connecting external client correspondents to
//! internal group channels through a moderated, privacy-preserving bridge.
//! Clients never see which group handles them; group members only see a
//! masked client identity; an admin layer gates who may communicate and
//! which group each approved client is bound to.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{BridgeError, Result};

// Re-export main components for easy access
pub use services::ServiceFactory;
pub use storage::IdentityStore;
pub use transport::{TelegramTransport, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
