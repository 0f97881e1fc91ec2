//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, and the privacy mask.

pub mod errors;
pub mod logging;
pub mod mask;

pub use errors::{BridgeError, Result};
pub use mask::{mask, REDACTION_MARKER};
