//! # Keyring Ledger
//!
//! The ledger client seam for Keyring. Identities anchor their roster and
//! every committed account list in an append-only, hash-linked ledger that
//! lives outside the identity service; this crate defines how the service
//! talks to it.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait with the four ledger operations
//! - [`MemoryLedger`] - Shared in-memory ledger for tests and single-process clusters
//! - [`verify_history`] - Offline audit of a data chain
//! - [`verify_update`] - Check a chain update before moving to its head
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyring_core::{AccountList, NodeId};
//! use keyring_ledger::{Ledger, MemoryLedger};
//!
//! async fn example(config: AccountList) {
//!     let ledger = MemoryLedger::new();
//!     let root = ledger.create_roster(&[NodeId::random()]).await.unwrap();
//!     let (root, genesis) = ledger.create_data(&root, &config).await.unwrap();
//!     let updates = ledger.get_update_chain(&root, &genesis.id).await.unwrap();
//!     assert_eq!(updates.last(), Some(&genesis));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Single writer per chain**: appends name the head they extend and fail
//!   with [`LedgerError::NotHead`] when it has moved
//! - **Newest last**: chain updates are ordered oldest to newest

pub mod audit;
pub mod error;
pub mod ledger;
pub mod memory;

pub use audit::{verify_history, verify_update};
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use memory::MemoryLedger;
