//! # Keyring
//!
//! A replicated identity service. An identity is an account list (named
//! owners, each with a public key, and an approval threshold) kept by a
//! roster of nodes and anchored in an external hash-linked ledger.
//!
//! ## Overview
//!
//! Changing an identity's owners takes three steps:
//!
//! - **Propose**: a client installs a new account list on one node, which
//!   relays it to the roster
//! - **Vote**: owners of the committed list sign the proposal's hash (or
//!   reject it); each ballot is relayed too
//! - **Commit**: once approvals meet the threshold, the node that took the
//!   deciding ballot appends the proposal to the ledger and tells the
//!   roster to fetch the new head
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keyring::{IdentityService, ServiceConfig};
//! use keyring::core::{AccountList, Keypair, NodeId};
//! use keyring::ledger::MemoryLedger;
//! use keyring::sync::MemoryNetwork;
//!
//! async fn example() -> keyring::Result<()> {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let network = MemoryNetwork::new();
//!     let node = NodeId::random();
//!     let service = IdentityService::new(
//!         Arc::clone(&ledger),
//!         network.create_transport(node).await,
//!         ServiceConfig::default(),
//!     );
//!
//!     let alice = Keypair::generate();
//!     let config = AccountList::new(1).with_owner("alice", alice.public_key());
//!     let reply = service.add_identity(vec![node], config.clone()).await?;
//!
//!     let next = config.with_owner("bob", Keypair::generate().public_key());
//!     service.propose_config(reply.id, next.clone(), None).await?;
//!     service
//!         .vote_config(reply.id, "alice", Some(alice.sign_config(&next)))
//!         .await?;
//!     assert_eq!(service.config_update(&reply.id).await?, next);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `keyring::core` - Account lists, blocks, replicas, crypto
//! - `keyring::ledger` - Ledger client trait and in-memory ledger
//! - `keyring::sync` - Peer messages, transport, propagation

pub mod config;
pub mod error;
pub mod registry;
pub mod service;

pub use config::{CommitPolicy, ServiceConfig};
pub use error::{KeyringError, Result};
pub use registry::{IdentityRegistry, Replica};
pub use service::{AddIdentityReply, IdentityService};

/// Re-export of the core crate.
pub mod core {
    pub use keyring_core::*;
}

/// Re-export of the ledger crate.
pub mod ledger {
    pub use keyring_ledger::*;
}

/// Re-export of the sync crate.
pub mod sync {
    pub use keyring_sync::*;
}
