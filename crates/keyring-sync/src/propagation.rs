//! Best-effort fan-out to the nodes replicating an identity.
//!
//! A propagation round sends one message to every roster peer except the
//! local node. Sends run concurrently, each bounded by a timeout, and the
//! round always waits for every outcome: one slow or dead peer neither
//! aborts the round nor hides the failures of others.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use keyring_core::NodeId;

use crate::error::{PeerFailure, PropagationError};
use crate::messages::IdentityMessage;
use crate::transport::Transport;

/// Configuration for propagation rounds.
#[derive(Debug, Clone)]
pub struct PropagationConfig {
    /// Upper bound on a single send; expiry counts as a failed send.
    pub send_timeout: Duration,
    /// Maximum sends in flight at once.
    pub max_in_flight: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(5),
            max_in_flight: 16,
        }
    }
}

/// Outcome of a round that had nothing fatal to report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    /// Peers the message was handed to.
    pub delivered: Vec<NodeId>,
}

/// Send `message` to every node in `roster` except the local one.
///
/// Returns the delivered peers on full success, or a [`PropagationError`]
/// listing each peer that failed.
pub async fn replicate<T: Transport + ?Sized>(
    transport: &T,
    roster: &[NodeId],
    message: &IdentityMessage,
    config: &PropagationConfig,
) -> Result<PropagationReport, PropagationError> {
    let local = transport.local_node_id();
    let mut peers: Vec<NodeId> = roster.iter().copied().filter(|p| *p != local).collect();
    peers.sort();
    peers.dedup();

    let timeout = config.send_timeout;
    let outcomes: Vec<(NodeId, Result<(), String>)> = stream::iter(peers)
        .map(|peer| async move {
            let outcome = match tokio::time::timeout(timeout, transport.send(&peer, message.clone()))
                .await
            {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("send timed out after {:?}", timeout)),
            };
            (peer, outcome)
        })
        .buffer_unordered(config.max_in_flight.max(1))
        .collect()
        .await;

    let mut report = PropagationReport::default();
    let mut failures = Vec::new();
    for (peer, outcome) in outcomes {
        match outcome {
            Ok(()) => report.delivered.push(peer),
            Err(reason) => {
                tracing::debug!(%peer, kind = message.kind(), %reason, "send failed");
                failures.push(PeerFailure { peer, reason });
            }
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        failures.sort_by_key(|f| f.peer);
        Err(PropagationError { failures })
    }
}
