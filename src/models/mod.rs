//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod client;
pub mod group;
pub mod event;

// Re-export commonly used models
pub use client::{Client, ClientStatus};
pub use group::Group;
pub use event::{
    AdminAction, ChatContext, InboundMessage, MessagePayload, OutboundAction, PayloadKind,
};
