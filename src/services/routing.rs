//! Routing table implementation
//!
//! Derived view over the identity store giving the current client-to-group
//! binding. Consulted on every content message; deliberately uncached since
//! a stale answer would misroute a message.

use tracing::debug;

use crate::storage::IdentityStore;
use crate::utils::errors::{BridgeError, Result};

/// Where a client-originated message should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Group(i64),
    NotBound,
    NotApproved,
}

/// Which client a group reply is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Client(i64),
    NoBinding,
    Ambiguous,
}

/// Routing service resolving message destinations and origins
#[derive(Debug, Clone)]
pub struct RoutingService {
    store: IdentityStore,
}

impl RoutingService {
    /// Create a new RoutingService instance
    pub fn new(store: IdentityStore) -> Self {
        Self { store }
    }

    /// Resolve the group a client's message is forwarded to.
    ///
    /// A binding is only honored while the target group is still
    /// registered; a vanished group reads as not bound.
    pub async fn resolve_destination(&self, client_id: i64) -> Result<Destination> {
        let client = self
            .store
            .get_client(client_id)
            .await
            .ok_or(BridgeError::UnknownClient { client_id })?;

        if !client.status.is_approved() {
            return Ok(Destination::NotApproved);
        }

        let destination = match client.status.assigned_group() {
            Some(group_id) if self.store.get_group(group_id).await.is_some() => {
                Destination::Group(group_id)
            }
            _ => Destination::NotBound,
        };

        debug!(client_id = client_id, destination = ?destination, "Destination resolved");
        Ok(destination)
    }

    /// Resolve the client a group reply is addressed to.
    ///
    /// With a single bound client the reply goes there. With several, an
    /// explicit reply-to reference is required and its absence (or a
    /// reference to a client not bound here) is ambiguous.
    pub async fn resolve_origin(&self, group_id: i64, reply_to: Option<i64>) -> Result<Origin> {
        let bound = self.store.clients_bound_to(group_id).await;

        let origin = match (bound.as_slice(), reply_to) {
            ([], _) => Origin::NoBinding,
            ([only], None) => Origin::Client(*only),
            (many, Some(target)) if many.contains(&target) => Origin::Client(target),
            ([only], Some(_)) => Origin::Client(*only),
            (_, _) => Origin::Ambiguous,
        };

        debug!(group_id = group_id, reply_to = ?reply_to, origin = ?origin, "Origin resolved");
        Ok(origin)
    }
}
