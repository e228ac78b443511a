//! Per-node registry of identity replicas.
//!
//! The map lock is held only to find or insert an entry. Each replica sits
//! behind its own mutex, so work on one identity never blocks another.

use std::collections::HashMap;
use std::sync::Arc;

use keyring_core::{IdentityId, IdentityStorage};
use tokio::sync::{Mutex, RwLock};

use crate::error::{KeyringError, Result};

/// Shared handle to one replica.
pub type Replica = Arc<Mutex<IdentityStorage>>;

/// Identity id to replica.
#[derive(Default)]
pub struct IdentityRegistry {
    identities: RwLock<HashMap<IdentityId, Replica>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a replica. Fails if the id is already present.
    pub async fn install(&self, storage: IdentityStorage) -> Result<Replica> {
        let mut identities = self.identities.write().await;
        if identities.contains_key(&storage.id) {
            return Err(KeyringError::AlreadyExists(storage.id));
        }
        let id = storage.id;
        let replica = Arc::new(Mutex::new(storage));
        identities.insert(id, Arc::clone(&replica));
        Ok(replica)
    }

    /// Handle to the replica for `id`.
    pub async fn lookup(&self, id: &IdentityId) -> Result<Replica> {
        self.identities
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(KeyringError::IdentityNotFound(*id))
    }

    /// Copy of the replica for `id` as it is right now.
    pub async fn snapshot(&self, id: &IdentityId) -> Result<IdentityStorage> {
        let replica = self.lookup(id).await?;
        let storage = replica.lock().await;
        Ok(storage.clone())
    }

    /// Ids of every replica, sorted.
    pub async fn list(&self) -> Vec<IdentityId> {
        let mut ids: Vec<_> = self.identities.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
