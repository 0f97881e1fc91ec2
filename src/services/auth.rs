//! Authentication service implementation
//!
//! Admin-set membership checks for the approval state machine. The admin
//! set lives in the identity store (seeded from configuration at startup),
//! so authorization decisions survive restarts together with the rest of
//! the state.

use tracing::{debug, warn};

use crate::storage::IdentityStore;
use crate::utils::errors::{BridgeError, Result};

/// Authorization checks for admin-only operations
#[derive(Debug, Clone)]
pub struct AuthService {
    store: IdentityStore,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(store: IdentityStore) -> Self {
        Self { store }
    }

    /// Check if user is an admin
    pub async fn is_admin(&self, user_id: i64) -> bool {
        self.store.is_admin(user_id).await
    }

    /// Require the actor to be an admin or fail with `NotAuthorized`,
    /// with no state change.
    pub async fn require_admin(&self, user_id: i64, action: &str) -> Result<()> {
        if self.store.is_admin(user_id).await {
            debug!(user_id = user_id, action = action, "Admin check passed");
            Ok(())
        } else {
            warn!(user_id = user_id, action = action, "Admin check failed");
            Err(BridgeError::NotAuthorized(format!(
                "user {} may not perform {}",
                user_id, action
            )))
        }
    }

    /// Get all admin user IDs
    pub async fn admin_ids(&self) -> Vec<i64> {
        self.store.admin_ids().await
    }
}
