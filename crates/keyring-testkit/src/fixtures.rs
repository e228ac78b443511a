//! Test fixtures and helpers.
//!
//! Owners are named `o1`, `o2`, ... and owner `i` signs with the keypair
//! seeded by `[i; 32]`, so every test agrees on who holds which key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use keyring::{IdentityService, ServiceConfig};
use keyring_core::{AccountList, Ed25519Signature, Keypair, NodeId};
use keyring_ledger::MemoryLedger;
use keyring_sync::{MemoryNetwork, MemoryTransport};
use tokio::task::JoinHandle;

/// Identity service wired to the in-memory ledger and transport.
pub type Node = IdentityService<Arc<MemoryLedger>, MemoryTransport>;

/// Name of owner `i`.
pub fn owner(i: u8) -> String {
    format!("o{i}")
}

/// Keypair of owner `i`.
pub fn owner_key(i: u8) -> Keypair {
    Keypair::from_seed(&[i; 32])
}

/// Account list of owners `o1..=on` with the given threshold.
pub fn account_list(owners: u8, threshold: u32) -> AccountList {
    (1..=owners).fold(AccountList::new(threshold), |list, i| {
        list.with_owner(owner(i), owner_key(i).public_key())
    })
}

/// Owner `i`'s approving ballot for `config`.
pub fn approve(i: u8, config: &AccountList) -> Ed25519Signature {
    owner_key(i).sign_config(config)
}

/// Route service logs to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Several identity services sharing one ledger and one network, each
/// serving peer messages on a background task.
pub struct Cluster {
    pub ledger: Arc<MemoryLedger>,
    pub network: Arc<MemoryNetwork>,
    nodes: Vec<Arc<Node>>,
    tasks: Vec<JoinHandle<keyring::Result<()>>>,
}

impl Cluster {
    /// Start `size` nodes with ids `[1; 32]`, `[2; 32]`, ...
    pub async fn start(size: u8, config: ServiceConfig) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let network = MemoryNetwork::new();

        let mut nodes = Vec::with_capacity(size as usize);
        let mut tasks = Vec::with_capacity(size as usize);
        for i in 1..=size {
            let transport = network.create_transport(NodeId::from_bytes([i; 32])).await;
            let node = Arc::new(IdentityService::new(
                Arc::clone(&ledger),
                transport,
                config.clone(),
            ));
            tasks.push(tokio::spawn(Arc::clone(&node).serve()));
            nodes.push(node);
        }

        Self {
            ledger,
            network,
            nodes,
            tasks,
        }
    }

    /// Node at position `i`, zero based.
    pub fn node(&self, i: usize) -> &Arc<Node> {
        &self.nodes[i]
    }

    /// Ids of every node, in start order.
    pub fn roster(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.node_id()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cut node `i` off the network. Its serve loop ends once drained.
    pub async fn disconnect(&self, i: usize) {
        self.network.disconnect(&self.nodes[i].node_id()).await;
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyring_core::validate_account_list;

    #[test]
    fn test_owner_keys_are_distinct() {
        let keys: Vec<_> = (1..=3).map(|i| owner_key(i).public_key()).collect();
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
    }

    #[test]
    fn test_account_list_fixture() {
        let list = account_list(3, 2);
        assert!(validate_account_list(&list).is_ok());
        assert_eq!(list.owner("o2"), Some(&owner_key(2).public_key()));
    }

    #[test]
    fn test_approval_verifies() {
        let list = account_list(2, 1);
        let sig = approve(1, &list);
        assert!(owner_key(1)
            .public_key()
            .verify(list.hash().as_bytes(), &sig)
            .is_ok());
    }

    #[tokio::test]
    async fn test_cluster_roster() {
        let cluster = Cluster::start(3, ServiceConfig::default()).await;
        assert_eq!(cluster.len(), 3);
        assert_eq!(cluster.roster()[1], NodeId::from_bytes([2; 32]));
        assert_eq!(cluster.node(2).node_id(), NodeId::from_bytes([3; 32]));
    }

    #[tokio::test]
    async fn test_eventually_times_out() {
        assert!(!eventually(Duration::from_millis(20), || async { false }).await);
        assert!(eventually(Duration::from_millis(20), || async { true }).await);
    }
}
