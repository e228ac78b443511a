//! # Keyring Testkit
//!
//! Testing utilities for Keyring.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: deterministic owner keys and an in-memory cluster of
//!   identity services sharing one ledger
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use keyring::ServiceConfig;
//! use keyring_testkit::fixtures::{account_list, Cluster};
//!
//! async fn example() {
//!     let cluster = Cluster::start(3, ServiceConfig::default()).await;
//!     let reply = cluster
//!         .node(0)
//!         .add_identity(cluster.roster(), account_list(2, 2))
//!         .await
//!         .unwrap();
//!     println!("created {}", reply.id);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keyring_testkit::generators::account_list;
//!
//! proptest! {
//!     #[test]
//!     fn generated_lists_are_valid(list in account_list(8)) {
//!         prop_assert!(keyring_core::validate_account_list(&list).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{account_list, approve, eventually, init_tracing, owner, owner_key, Cluster, Node};
pub use generators::{Ballot, VotingRound};
