//! Client model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Lifecycle state of a client.
///
/// The assigned group lives inside the `Approved` variant so that a bound
/// pending or rejected client is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClientStatus {
    Pending,
    Approved { assigned_group: Option<i64> },
    Rejected,
}

impl ClientStatus {
    /// Stable name of the state, used for compare-and-swap transitions
    /// and structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientStatus::Pending => "pending",
            ClientStatus::Approved { .. } => "approved",
            ClientStatus::Rejected => "rejected",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ClientStatus::Pending)
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ClientStatus::Approved { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientStatus::Rejected)
    }

    /// Current group binding, present only for bound approved clients.
    pub fn assigned_group(&self) -> Option<i64> {
        match self {
            ClientStatus::Approved { assigned_group } => *assigned_group,
            _ => None,
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientStatus::Approved {
                assigned_group: Some(group_id),
            } => write!(f, "approved (bound to group {})", group_id),
            ClientStatus::Approved {
                assigned_group: None,
            } => write!(f, "approved (no group assigned)"),
            ClientStatus::Pending => write!(f, "pending"),
            ClientStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// An external correspondent communicating through the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Opaque platform user id; unique and immutable.
    pub telegram_id: i64,
    /// Platform-supplied display name; mutable.
    pub display_name: String,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Create a fresh pending record for a previously unseen identity.
    pub fn pending(telegram_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            telegram_id,
            display_name: display_name.into(),
            status: ClientStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
