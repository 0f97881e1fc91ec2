//! Approval state machine implementation
//!
//! Owns client lifecycle transitions (pending, approved, rejected), the
//! client-to-group binding, and group registration. Every mutation is
//! authorized against the admin set and committed through the identity
//! store's compare-and-swap, so two admins racing to resolve the same
//! client cannot both succeed.

use tracing::{debug, info};

use crate::models::client::{Client, ClientStatus};
use crate::models::group::Group;
use crate::services::auth::AuthService;
use crate::storage::IdentityStore;
use crate::utils::errors::{BridgeError, Result};

/// Approval and registration service
#[derive(Debug, Clone)]
pub struct ApprovalService {
    store: IdentityStore,
    auth: AuthService,
}

impl ApprovalService {
    /// Create a new ApprovalService instance
    pub fn new(store: IdentityStore, auth: AuthService) -> Self {
        Self { store, auth }
    }

    /// Look up a client, creating a pending record on first contact.
    ///
    /// Returns the record and whether it was just created; the relay uses
    /// the flag to decide whether to prompt the admins. An existing record
    /// gets its display name refreshed.
    pub async fn register_or_get_client(
        &self,
        telegram_id: i64,
        display_name: &str,
    ) -> Result<(Client, bool)> {
        if let Some(existing) = self.store.get_client(telegram_id).await {
            self.store
                .update_display_name(telegram_id, display_name)
                .await?;
            let mut client = existing;
            client.display_name = display_name.to_string();
            return Ok((client, false));
        }

        let client = Client::pending(telegram_id, display_name);
        self.store.upsert_client(client.clone()).await?;
        info!(client_id = telegram_id, "New client registered as pending");
        Ok((client, true))
    }

    /// Approve a pending client. The client stays unbound until an
    /// explicit assignment.
    pub async fn approve(&self, actor_id: i64, client_id: i64) -> Result<Client> {
        self.auth.require_admin(actor_id, "approve").await?;
        let client = self
            .store
            .transition_client(
                client_id,
                "pending",
                ClientStatus::Approved {
                    assigned_group: None,
                },
            )
            .await?;
        info!(admin_id = actor_id, client_id = client_id, "Client approved");
        Ok(client)
    }

    /// Reject a pending client. Further messages from it are dropped
    /// silently until an explicit reset.
    pub async fn reject(&self, actor_id: i64, client_id: i64) -> Result<Client> {
        self.auth.require_admin(actor_id, "reject").await?;
        let client = self
            .store
            .transition_client(client_id, "pending", ClientStatus::Rejected)
            .await?;
        info!(admin_id = actor_id, client_id = client_id, "Client rejected");
        Ok(client)
    }

    /// Return a resolved client to the pending queue.
    pub async fn reset(&self, actor_id: i64, client_id: i64) -> Result<Client> {
        self.auth.require_admin(actor_id, "reset").await?;

        let current = self
            .store
            .get_client(client_id)
            .await
            .ok_or(BridgeError::UnknownClient { client_id })?;
        if current.status.is_pending() {
            return Err(BridgeError::InvalidInput(format!(
                "client {} is already pending",
                client_id
            )));
        }

        // CAS against the status we just read; a concurrent transition
        // surfaces as StaleState rather than being overwritten
        let client = self
            .store
            .transition_client(client_id, current.status.kind(), ClientStatus::Pending)
            .await?;
        info!(admin_id = actor_id, client_id = client_id, "Client reset to pending");
        Ok(client)
    }

    /// Bind an approved client to a registered group. Any admin may bind
    /// any registered group; rebinding replaces the previous assignment.
    pub async fn assign(&self, actor_id: i64, client_id: i64, group_id: i64) -> Result<Client> {
        self.auth.require_admin(actor_id, "assign").await?;

        if self.store.get_group(group_id).await.is_none() {
            return Err(BridgeError::UnknownGroup { group_id });
        }

        let client = self
            .store
            .transition_client(
                client_id,
                "approved",
                ClientStatus::Approved {
                    assigned_group: Some(group_id),
                },
            )
            .await?;
        info!(
            admin_id = actor_id,
            client_id = client_id,
            group_id = group_id,
            "Client assigned to group"
        );
        Ok(client)
    }

    /// Remove a client record and its binding. Idempotent.
    pub async fn delete_client(&self, actor_id: i64, client_id: i64) -> Result<bool> {
        self.auth.require_admin(actor_id, "delete_client").await?;
        let deleted = self.store.delete_client(client_id).await?;
        if deleted {
            info!(admin_id = actor_id, client_id = client_id, "Client deleted");
        } else {
            debug!(admin_id = actor_id, client_id = client_id, "Delete of unknown client ignored");
        }
        Ok(deleted)
    }

    /// Register a group chat as a relay destination.
    pub async fn register_group(&self, actor_id: i64, group_id: i64, title: &str) -> Result<Group> {
        self.auth.require_admin(actor_id, "register_group").await?;
        let group = Group::new(group_id, title, actor_id);
        self.store.upsert_group(group.clone()).await?;
        info!(admin_id = actor_id, group_id = group_id, title = %title, "Group registered");
        Ok(group)
    }

    /// Deregister a group, unbinding (not deleting) its clients.
    /// Idempotent; returns the unbound client ids.
    pub async fn delete_group(&self, actor_id: i64, group_id: i64) -> Result<Option<Vec<i64>>> {
        self.auth.require_admin(actor_id, "delete_group").await?;
        let unbound = self.store.delete_group(group_id).await?;
        match &unbound {
            Some(ids) => info!(
                admin_id = actor_id,
                group_id = group_id,
                unbound = ids.len(),
                "Group deregistered"
            ),
            None => debug!(admin_id = actor_id, group_id = group_id, "Delete of unknown group ignored"),
        }
        Ok(unbound)
    }

    /// Pending clients, oldest first.
    pub async fn list_pending(&self, actor_id: i64) -> Result<Vec<Client>> {
        self.auth.require_admin(actor_id, "list_pending").await?;
        Ok(self.store.list_pending().await)
    }

    /// All known clients, oldest first.
    pub async fn list_clients(&self, actor_id: i64) -> Result<Vec<Client>> {
        self.auth.require_admin(actor_id, "list_clients").await?;
        Ok(self.store.list_clients().await)
    }

    /// Add a new admin to the set. Returns `false` when already present.
    pub async fn add_admin(&self, actor_id: i64, user_id: i64) -> Result<bool> {
        self.auth.require_admin(actor_id, "add_admin").await?;
        let added = self.store.add_admin(user_id).await?;
        if added {
            info!(admin_id = actor_id, new_admin_id = user_id, "Admin added");
        }
        Ok(added)
    }
}
