//! Command handlers module
//!
//! The admin command surface: parses nothing itself beyond what the
//! `BotCommands` derive already split, and hands discrete actions to the
//! engine.

pub mod admin;
pub mod help;
pub mod start;
