//! Transport abstraction for peer messages.
//!
//! The transport delivers one typed message to one peer and reports whether
//! the send succeeded. It promises nothing about ordering across peers or
//! across successive sends. Implementations may use TCP, QUIC, or anything
//! else.

use async_trait::async_trait;

use keyring_core::NodeId;

use crate::error::Result;
use crate::messages::IdentityMessage;

/// Point-to-point delivery of identity messages between roster nodes.
///
/// One transport is shared by every identity a node serves.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand `message` to `peer`. Success means the peer's inbox accepted it.
    async fn send(&self, peer: &NodeId, message: IdentityMessage) -> Result<()>;

    /// Next inbound message and the node that sent it.
    ///
    /// Fails once the transport has been shut down.
    async fn recv(&self) -> Result<(NodeId, IdentityMessage)>;

    /// Like [`Transport::recv`], but `None` when nothing arrives in time.
    async fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<Option<(NodeId, IdentityMessage)>>;

    /// Id of the node this transport belongs to.
    fn local_node_id(&self) -> NodeId;

    /// Peers currently reachable.
    async fn connected_peers(&self) -> Result<Vec<NodeId>>;

    /// Whether `peer` is currently reachable.
    async fn is_connected(&self, peer: &NodeId) -> bool;
}

/// A simple in-memory transport for tests and single-process clusters.
///
/// Messages cross the channel as encoded frames, so everything a node sends
/// goes through the same codec a network transport would use.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::{mpsc, Mutex, RwLock};

    use crate::error::SyncError;

    /// Encoded message plus its sender.
    #[derive(Debug)]
    struct Envelope {
        from: NodeId,
        frame: Vec<u8>,
    }

    /// Inbox registry shared by every in-memory transport.
    pub struct MemoryNetwork {
        /// Inbox of each attached node.
        senders: RwLock<HashMap<NodeId, mpsc::Sender<Envelope>>>,
    }

    impl MemoryNetwork {
        /// Empty network.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Attach `node_id` to the network and return its transport.
        pub async fn create_transport(self: &Arc<Self>, node_id: NodeId) -> MemoryTransport {
            let (tx, rx) = mpsc::channel(1000);

            self.senders.write().await.insert(node_id, tx);

            MemoryTransport {
                node_id,
                network: Arc::clone(self),
                receiver: Mutex::new(rx),
            }
        }

        /// Drop a node from the network.
        ///
        /// Sends to it fail from now on, and its own `recv` returns an error
        /// once queued messages are drained.
        pub async fn disconnect(&self, node_id: &NodeId) {
            self.senders.write().await.remove(node_id);
        }
    }

    impl Default for MemoryNetwork {
        fn default() -> Self {
            Self {
                senders: RwLock::new(HashMap::new()),
            }
        }
    }

    /// One node's handle on a [`MemoryNetwork`].
    pub struct MemoryTransport {
        node_id: NodeId,
        network: Arc<MemoryNetwork>,
        receiver: Mutex<mpsc::Receiver<Envelope>>,
    }

    impl MemoryTransport {
        fn open(envelope: Envelope) -> Result<(NodeId, IdentityMessage)> {
            let message = IdentityMessage::from_bytes(&envelope.frame)?;
            Ok((envelope.from, message))
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&self, peer: &NodeId, message: IdentityMessage) -> Result<()> {
            let frame = message.to_bytes()?;
            let sender = self
                .network
                .senders
                .read()
                .await
                .get(peer)
                .cloned()
                .ok_or(SyncError::PeerNotConnected(*peer))?;

            sender
                .send(Envelope {
                    from: self.node_id,
                    frame,
                })
                .await
                .map_err(|_| SyncError::TransportError("peer disconnected".into()))
        }

        async fn recv(&self) -> Result<(NodeId, IdentityMessage)> {
            let mut rx = self.receiver.lock().await;
            match rx.recv().await {
                Some(envelope) => Self::open(envelope),
                None => Err(SyncError::TransportError("channel closed".into())),
            }
        }

        async fn recv_timeout(
            &self,
            timeout: std::time::Duration,
        ) -> Result<Option<(NodeId, IdentityMessage)>> {
            let mut rx = self.receiver.lock().await;
            match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(envelope)) => Self::open(envelope).map(Some),
                Ok(None) => Err(SyncError::TransportError("channel closed".into())),
                Err(_elapsed) => Ok(None),
            }
        }

        fn local_node_id(&self) -> NodeId {
            self.node_id
        }

        async fn connected_peers(&self) -> Result<Vec<NodeId>> {
            let senders = self.network.senders.read().await;
            Ok(senders
                .keys()
                .filter(|id| *id != &self.node_id)
                .copied()
                .collect())
        }

        async fn is_connected(&self, peer: &NodeId) -> bool {
            self.network.senders.read().await.contains_key(peer)
        }
    }
}
