//! # Keyring Sync
//!
//! Moving identity state between the nodes that replicate it.
//!
//! ## Overview
//!
//! Every identity names a roster of nodes. When one node changes its replica
//! on behalf of a client, it tells the rest of the roster: a new identity,
//! a new proposal, a ballot, or a ledger advance. Delivery is best effort;
//! nodes that miss a message catch up from the ledger later.
//!
//! ## Key Properties
//!
//! - **Concurrent fan-out**: sends to different peers overlap, bounded by
//!   [`PropagationConfig::max_in_flight`]
//! - **Bounded**: every send has a timeout; expiry is a failed send
//! - **Aggregated failures**: one [`PropagationError`] lists every peer that
//!   missed the message
//! - **No relay loops**: peer-originated messages carry [`Origin::Peer`] and
//!   are never forwarded again
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyring_core::{IdentityId, NodeId};
//! use keyring_sync::{replicate, IdentityMessage, MemoryNetwork, PropagationConfig};
//!
//! async fn example(roster: Vec<NodeId>, id: IdentityId) {
//!     let network = MemoryNetwork::new();
//!     let transport = network.create_transport(roster[0]).await;
//!
//!     let message = IdentityMessage::UpdateSkipBlock { id };
//!     match replicate(&transport, &roster, &message, &PropagationConfig::default()).await {
//!         Ok(report) => println!("delivered to {} peers", report.delivered.len()),
//!         Err(e) => eprintln!("partial propagation: {e}"),
//!     }
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Client        Node A                     Node B, C
//!   |-- vote -->|                            |
//!   |           |-------- Vote ------------->|  recorded, not relayed
//!   |           |-- ledger append            |
//!   |           |-------- UpdateSkipBlock -->|  fetch chain update
//!   |<-- head --|                            |
//! ```

pub mod error;
pub mod messages;
pub mod propagation;
pub mod transport;

pub use error::{PeerFailure, PropagationError, Result, SyncError};
pub use messages::{limits, IdentityMessage, Origin, PROTOCOL_VERSION};
pub use propagation::{replicate, PropagationConfig, PropagationReport};
pub use transport::{memory::MemoryNetwork, memory::MemoryTransport, Transport};
