//! Group model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// An internal chat registered to receive forwarded client messages.
///
/// Presence in the identity store is the registered flag; an unregistered
/// group simply has no record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Opaque platform chat id; unique.
    pub telegram_id: i64,
    pub title: String,
    /// Admin who registered the group.
    pub registered_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(telegram_id: i64, title: impl Into<String>, registered_by: i64) -> Self {
        Self {
            telegram_id,
            title: title.into(),
            registered_by,
            created_at: Utc::now(),
        }
    }
}
