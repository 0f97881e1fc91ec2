//! Identity store implementation
//!
//! Durable mapping of client id to lifecycle record, group id to
//! registration record, and the admin id set. The whole state is held in
//! memory and persisted as a JSON snapshot; every mutation is written
//! durably (temp file + rename) before it becomes visible, and a failed
//! write leaves the in-memory state at the last durable snapshot.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::client::{Client, ClientStatus};
use crate::models::group::Group;
use crate::utils::errors::{BridgeError, Result};

/// Serialized shape of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    clients: HashMap<i64, Client>,
    groups: HashMap<i64, Group>,
    admins: BTreeSet<i64>,
}

/// The sole shared mutable resource of the engine.
///
/// Cheap to clone; all clones share the same state. Mutations run under the
/// write lock: the change is applied to a staged copy, persisted, and only
/// then swapped in, so readers never observe a partial write.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    inner: Arc<RwLock<Snapshot>>,
    snapshot_path: Option<PathBuf>,
}

impl IdentityStore {
    /// Open a store backed by a snapshot file, recovering the exact
    /// last-committed state if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            clients = snapshot.clients.len(),
            groups = snapshot.groups.len(),
            "Identity store opened"
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(snapshot)),
            snapshot_path: Some(path),
        })
    }

    /// Create a volatile store with no backing file. Used in tests and
    /// useful for dry runs.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Snapshot::default())),
            snapshot_path: None,
        }
    }

    /// Apply a mutation to a staged copy of the state, persist it, and
    /// swap it in. On any failure the live state is left untouched.
    async fn commit<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot) -> Result<T>,
    {
        let mut guard = self.inner.write().await;
        let mut staged = guard.clone();
        let out = apply(&mut staged)?;
        self.persist(&staged).await?;
        *guard = staged;
        Ok(out)
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        // Rename within the same directory makes the snapshot swap atomic
        tokio::fs::rename(&tmp_path, path).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "Snapshot persisted");
        Ok(())
    }

    // --- clients ---

    pub async fn get_client(&self, client_id: i64) -> Option<Client> {
        self.inner.read().await.clients.get(&client_id).cloned()
    }

    pub async fn upsert_client(&self, client: Client) -> Result<()> {
        self.commit(|snapshot| {
            snapshot.clients.insert(client.telegram_id, client);
            Ok(())
        })
        .await
    }

    /// Refresh the platform-supplied display name, if the client exists.
    pub async fn update_display_name(&self, client_id: i64, display_name: &str) -> Result<()> {
        let unchanged = {
            let guard = self.inner.read().await;
            match guard.clients.get(&client_id) {
                Some(client) => client.display_name == display_name,
                None => true,
            }
        };
        if unchanged {
            return Ok(());
        }

        self.commit(|snapshot| {
            if let Some(client) = snapshot.clients.get_mut(&client_id) {
                client.display_name = display_name.to_string();
            }
            Ok(())
        })
        .await
    }

    /// Compare-and-swap lifecycle transition.
    ///
    /// Commits only if the stored status still has `expected` kind;
    /// otherwise fails with [`BridgeError::StaleState`] carrying the status
    /// actually found, and nothing changes.
    pub async fn transition_client(
        &self,
        client_id: i64,
        expected: &'static str,
        next: ClientStatus,
    ) -> Result<Client> {
        self.commit(move |snapshot| {
            let client = snapshot
                .clients
                .get_mut(&client_id)
                .ok_or(BridgeError::UnknownClient { client_id })?;

            if client.status.kind() != expected {
                return Err(BridgeError::StaleState {
                    client_id,
                    expected,
                    actual: client.status.clone(),
                });
            }

            client.status = next;
            Ok(client.clone())
        })
        .await
    }

    /// Delete a client record. Idempotent: deleting an absent client is a
    /// no-op and returns `false`.
    pub async fn delete_client(&self, client_id: i64) -> Result<bool> {
        if self.get_client(client_id).await.is_none() {
            return Ok(false);
        }
        self.commit(move |snapshot| Ok(snapshot.clients.remove(&client_id).is_some()))
            .await
    }

    /// All pending clients, oldest first.
    pub async fn list_pending(&self) -> Vec<Client> {
        let guard = self.inner.read().await;
        let mut pending: Vec<Client> = guard
            .clients
            .values()
            .filter(|c| c.status.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.telegram_id.cmp(&b.telegram_id))
        });
        pending
    }

    /// All known clients, oldest first.
    pub async fn list_clients(&self) -> Vec<Client> {
        let guard = self.inner.read().await;
        let mut clients: Vec<Client> = guard.clients.values().cloned().collect();
        clients.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.telegram_id.cmp(&b.telegram_id))
        });
        clients
    }

    /// Ids of clients currently bound to a group.
    pub async fn clients_bound_to(&self, group_id: i64) -> Vec<i64> {
        let guard = self.inner.read().await;
        let mut bound: Vec<i64> = guard
            .clients
            .values()
            .filter(|c| c.status.assigned_group() == Some(group_id))
            .map(|c| c.telegram_id)
            .collect();
        bound.sort_unstable();
        bound
    }

    // --- groups ---

    pub async fn get_group(&self, group_id: i64) -> Option<Group> {
        self.inner.read().await.groups.get(&group_id).cloned()
    }

    pub async fn upsert_group(&self, group: Group) -> Result<()> {
        self.commit(|snapshot| {
            snapshot.groups.insert(group.telegram_id, group);
            Ok(())
        })
        .await
    }

    /// Delete a group registration, unbinding every client that pointed to
    /// it. The unbound clients stay approved. Returns the unbound client
    /// ids, or `None` when the group was not registered (no-op).
    pub async fn delete_group(&self, group_id: i64) -> Result<Option<Vec<i64>>> {
        if self.get_group(group_id).await.is_none() {
            return Ok(None);
        }

        self.commit(move |snapshot| {
            snapshot.groups.remove(&group_id);

            let mut unbound = Vec::new();
            for client in snapshot.clients.values_mut() {
                if client.status.assigned_group() == Some(group_id) {
                    client.status = ClientStatus::Approved {
                        assigned_group: None,
                    };
                    unbound.push(client.telegram_id);
                }
            }
            unbound.sort_unstable();
            Ok(Some(unbound))
        })
        .await
    }

    pub async fn list_groups(&self) -> Vec<Group> {
        let guard = self.inner.read().await;
        let mut groups: Vec<Group> = guard.groups.values().cloned().collect();
        groups.sort_by_key(|g| g.telegram_id);
        groups
    }

    // --- admins ---

    pub async fn is_admin(&self, user_id: i64) -> bool {
        self.inner.read().await.admins.contains(&user_id)
    }

    pub async fn admin_ids(&self) -> Vec<i64> {
        self.inner.read().await.admins.iter().copied().collect()
    }

    /// Add an admin. Returns `false` when already present.
    pub async fn add_admin(&self, user_id: i64) -> Result<bool> {
        if self.is_admin(user_id).await {
            return Ok(false);
        }
        self.commit(move |snapshot| Ok(snapshot.admins.insert(user_id)))
            .await
    }

    /// Merge the bootstrap admins from configuration into the store.
    pub async fn seed_admins(&self, admin_ids: &[i64]) -> Result<()> {
        let missing: Vec<i64> = {
            let guard = self.inner.read().await;
            admin_ids
                .iter()
                .copied()
                .filter(|id| !guard.admins.contains(id))
                .collect()
        };
        if missing.is_empty() {
            return Ok(());
        }

        self.commit(move |snapshot| {
            snapshot.admins.extend(missing);
            Ok(())
        })
        .await
    }
}
