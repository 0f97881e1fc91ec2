//! Identity store module
//!
//! Durable client/group/admin records with atomic, compare-and-swap-guarded
//! mutations, plus the in-memory reply-link map for group reply routing.

pub mod links;
pub mod store;

pub use links::ReplyLinks;
pub use store::IdentityStore;
