//! Error types for the sync module.

use keyring_core::NodeId;
use thiserror::Error;

/// Errors that can occur while moving messages between nodes.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Protocol version mismatch with peer.
    #[error("protocol version mismatch: local={local}, peer={peer}")]
    VersionMismatch { local: u8, peer: u8 },

    /// Message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Peer is not connected.
    #[error("peer not connected: {0}")]
    PeerNotConnected(NodeId),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// One peer that could not be reached during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    /// The unreachable peer.
    pub peer: NodeId,
    /// Why the send failed.
    pub reason: String,
}

/// Aggregate of every failed send in one propagation round.
///
/// Never fatal on its own: the local change that triggered the fan-out
/// stands, and lagging peers catch up through chain updates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} peer(s) unreachable: {}", .failures.len(), summarize(.failures))]
pub struct PropagationError {
    /// Failed sends, one per peer.
    pub failures: Vec<PeerFailure>,
}

impl PropagationError {
    /// Peers that did not receive the message.
    pub fn peers(&self) -> Vec<NodeId> {
        self.failures.iter().map(|f| f.peer).collect()
    }
}

fn summarize(failures: &[PeerFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.peer, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}
