//! The identity service: one node's handler for client requests and
//! peer messages.
//!
//! Client requests that change a replica are relayed to the rest of the
//! roster; the same change arriving from a peer is applied locally and goes
//! no further. Only client ballots commit to the ledger.

use std::future::Future;
use std::sync::Arc;

use keyring_core::{
    validate_account_list, validate_block, AccountList, Blake3Hash, Block, Ed25519Signature,
    IdentityId, IdentityStorage, NodeId,
};
use keyring_ledger::{verify_update, Ledger, LedgerError};
use keyring_sync::{
    replicate, IdentityMessage, Origin, PropagationError, PropagationReport, SyncError, Transport,
};

use crate::config::{CommitPolicy, ServiceConfig};
use crate::error::{KeyringError, Result};
use crate::registry::IdentityRegistry;

/// Reply to [`IdentityService::add_identity`].
#[derive(Debug, Clone)]
pub struct AddIdentityReply {
    pub id: IdentityId,
    pub root: Block,
    pub data: Block,
    /// Peers that did not receive the new replica. The identity exists
    /// locally and on the ledger either way.
    pub propagation_failure: Option<PropagationError>,
}

/// Identity service for one node.
pub struct IdentityService<L: Ledger, T: Transport> {
    ledger: L,
    transport: T,
    registry: IdentityRegistry,
    config: ServiceConfig,
}

impl<L: Ledger, T: Transport> IdentityService<L, T> {
    pub fn new(ledger: L, transport: T, config: ServiceConfig) -> Self {
        Self {
            ledger,
            transport,
            registry: IdentityRegistry::new(),
            config,
        }
    }

    /// This node's id.
    pub fn node_id(&self) -> NodeId {
        self.transport.local_node_id()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Ids of every identity this node replicates.
    pub async fn identities(&self) -> Vec<IdentityId> {
        self.registry.list().await
    }

    /// Copy of this node's replica of `id`.
    pub async fn snapshot(&self, id: &IdentityId) -> Result<IdentityStorage> {
        self.registry.snapshot(id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Client Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an identity replicated by `roster` and owned by `config`.
    ///
    /// Anchors a root block and a genesis data block on the ledger, installs
    /// the replica locally, then hands it to every other roster node.
    pub async fn add_identity(
        &self,
        roster: Vec<NodeId>,
        config: AccountList,
    ) -> Result<AddIdentityReply> {
        validate_account_list(&config)?;

        let root = self
            .ledger_call("create_roster", self.ledger.create_roster(&roster))
            .await?;
        let (root, data) = self
            .ledger_call("create_data", self.ledger.create_data(&root, &config))
            .await?;

        let storage = IdentityStorage::new(config, root.clone(), data.clone());
        let id = storage.id;
        self.registry.install(storage.clone()).await?;
        tracing::info!(identity = %id, peers = roster.len(), "identity created");

        let propagation_failure = self
            .relay(&roster, IdentityMessage::PropagateIdentity { storage })
            .await
            .err();

        Ok(AddIdentityReply {
            id,
            root,
            data,
            propagation_failure,
        })
    }

    /// Record a new proposal for `id` and relay it to the roster.
    ///
    /// With `base` set, the proposal is only accepted while the committed
    /// list still hashes to `base`.
    pub async fn propose_config(
        &self,
        id: IdentityId,
        config: AccountList,
        base: Option<Blake3Hash>,
    ) -> Result<()> {
        self.propose(id, config, base, Origin::Client).await
    }

    /// The pending proposal for `id`, if any.
    pub async fn config_new_check(&self, id: &IdentityId) -> Result<Option<AccountList>> {
        Ok(self.registry.snapshot(id).await?.proposed)
    }

    /// The committed account list for `id`.
    pub async fn config_update(&self, id: &IdentityId) -> Result<AccountList> {
        Ok(self.registry.snapshot(id).await?.latest)
    }

    /// Cast `signer`'s ballot on the current proposal for `id`.
    ///
    /// `Some(signature)` approves and must sign the proposal's hash; `None`
    /// rejects. Returns the new data head when the ballot committed.
    pub async fn vote_config(
        &self,
        id: IdentityId,
        signer: &str,
        signature: Option<Ed25519Signature>,
    ) -> Result<Option<Block>> {
        self.vote(id, signer, signature, Origin::Client).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Peer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Install a replica created on another node.
    pub async fn propagate_identity(&self, storage: IdentityStorage) -> Result<()> {
        if !storage.roster().contains(&self.node_id()) {
            return Err(KeyringError::InvalidMessage(format!(
                "node {} is not in the roster of {}",
                self.node_id(),
                storage.id
            )));
        }
        validate_block(&storage.root)
            .and_then(|_| validate_block(&storage.data))
            .map_err(|e| KeyringError::InvalidMessage(e.to_string()))?;
        if !storage.data.descends_from(&storage.root) {
            return Err(KeyringError::InvalidMessage(format!(
                "data block {} does not descend from root {}",
                storage.data.id, storage.root.id
            )));
        }
        // a fresh replica sits on its genesis block, which names the identity
        if storage.data.index != 0 || storage.id != IdentityId::from(storage.data.id) {
            return Err(KeyringError::InvalidMessage(format!(
                "identity {} is not named by genesis block {}",
                storage.id, storage.data.id
            )));
        }
        if storage.data.config.as_ref() != Some(&storage.latest) {
            return Err(KeyringError::InvalidMessage(format!(
                "latest config of {} differs from block {}",
                storage.id, storage.data.id
            )));
        }

        let id = storage.id;
        self.registry.install(storage).await?;
        tracing::info!(identity = %id, "replica installed");
        Ok(())
    }

    /// Catch up with the ledger: fetch blocks appended after the known head
    /// and move to the newest one.
    ///
    /// Under [`CommitPolicy::EveryBallot`] the pending round survives, as it
    /// does on the node that appended the block.
    pub async fn propagate_skip_block(&self, id: IdentityId) -> Result<()> {
        let replica = self.registry.lookup(&id).await?;
        let mut storage = replica.lock().await;

        let update = self
            .ledger_call(
                "get_update_chain",
                self.ledger.get_update_chain(&storage.root, &storage.data.id),
            )
            .await?;
        let head = verify_update(&storage.root, &storage.data, &update)?.clone();

        let index = head.index;
        let moved = match self.config.commit_policy {
            CommitPolicy::Threshold => storage.advance(head),
            CommitPolicy::EveryBallot => storage.follow(head),
        };
        if moved {
            tracing::info!(identity = %id, index, "data head advanced");
        } else {
            tracing::debug!(identity = %id, "data head already current");
        }
        Ok(())
    }

    /// Dispatch one message received from `from`.
    pub async fn handle_message(&self, from: NodeId, message: IdentityMessage) -> Result<()> {
        message
            .validate_limits()
            .map_err(|reason| KeyringError::InvalidMessage(reason.into()))?;
        tracing::debug!(%from, kind = message.kind(), identity = %message.identity(), "peer message");

        match message {
            IdentityMessage::PropagateIdentity { storage } => self.propagate_identity(storage).await,
            IdentityMessage::ProposeConfig { id, config } => {
                self.propose(id, config, None, Origin::Peer).await
            }
            IdentityMessage::Vote {
                id,
                signer,
                signature,
            } => self.vote(id, &signer, signature, Origin::Peer).await.map(|_| ()),
            IdentityMessage::UpdateSkipBlock { id } => self.propagate_skip_block(id).await,
        }
    }

    /// Receive and handle peer messages until the transport closes.
    ///
    /// Each message runs on its own task; handler errors are logged and do
    /// not stop the loop. Undecodable frames are dropped.
    pub async fn serve(self: Arc<Self>) -> Result<()>
    where
        L: 'static,
        T: 'static,
    {
        tracing::info!(node = %self.node_id(), "serving peer messages");
        loop {
            let (from, message) = match self.transport.recv().await {
                Ok(received) => received,
                Err(e @ (SyncError::Codec(_) | SyncError::VersionMismatch { .. })) => {
                    tracing::warn!(error = %e, "dropping undecodable frame");
                    continue;
                }
                Err(e) => {
                    tracing::info!(node = %self.node_id(), reason = %e, "transport closed");
                    return Ok(());
                }
            };

            let service = Arc::clone(&self);
            tokio::spawn(async move {
                let kind = message.kind();
                let identity = message.identity();
                if let Err(e) = service.handle_message(from, message).await {
                    tracing::warn!(%from, kind, %identity, error = %e, "peer message rejected");
                }
            });
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn propose(
        &self,
        id: IdentityId,
        config: AccountList,
        base: Option<Blake3Hash>,
        origin: Origin,
    ) -> Result<()> {
        validate_account_list(&config)?;

        let replica = self.registry.lookup(&id).await?;
        let roster = {
            let mut storage = replica.lock().await;
            if let Some(base) = base {
                let latest = storage.latest.hash();
                if base != latest {
                    return Err(KeyringError::StaleProposal { base, latest });
                }
            }
            storage.install_proposal(config.clone());
            tracing::info!(identity = %id, ?origin, proposal = %config.hash(), "proposal installed");
            storage.roster().to_vec()
        };

        if origin == Origin::Client {
            // an unreachable peer will learn the outcome from the ledger
            if let Ok(report) = self
                .relay(&roster, IdentityMessage::ProposeConfig { id, config })
                .await
            {
                tracing::debug!(identity = %id, peers = report.delivered.len(), "proposal relayed");
            }
        }
        Ok(())
    }

    async fn vote(
        &self,
        id: IdentityId,
        signer: &str,
        signature: Option<Ed25519Signature>,
        origin: Origin,
    ) -> Result<Option<Block>> {
        let replica = self.registry.lookup(&id).await?;

        // held across the ledger append so no other ballot races the commit
        let mut storage = replica.lock().await;

        let key = *storage
            .latest
            .owner(signer)
            .ok_or_else(|| KeyringError::UnknownSigner(signer.to_string()))?;
        let proposed = storage.proposed.clone().ok_or(KeyringError::NoProposal(id))?;
        if storage.has_voted(signer) {
            return Err(KeyringError::DuplicateVote(signer.to_string()));
        }
        if let Some(sig) = &signature {
            key.verify(proposed.hash().as_bytes(), sig)
                .map_err(|_| KeyringError::InvalidSignature(signer.to_string()))?;
        }

        storage.votes.insert(signer.to_string(), signature.clone());
        tracing::debug!(
            identity = %id,
            signer,
            approve = signature.is_some(),
            ?origin,
            "ballot recorded"
        );
        if storage.quorum_reached() {
            tracing::info!(
                identity = %id,
                approvals = storage.approvals(),
                ballots = storage.votes.len(),
                "quorum reached"
            );
        }

        if origin == Origin::Peer {
            return Ok(None);
        }

        let commit = match self.config.commit_policy {
            CommitPolicy::Threshold => storage.approvals() >= storage.latest.threshold as usize,
            CommitPolicy::EveryBallot => true,
        };

        let head = if commit {
            let appended = self
                .ledger_call(
                    "propose_data",
                    self.ledger.propose_data(&storage.root, &storage.data, &proposed),
                )
                .await;
            match appended {
                Ok(head) => {
                    match self.config.commit_policy {
                        CommitPolicy::Threshold => storage.commit(head.clone()),
                        CommitPolicy::EveryBallot => storage.anchor(head.clone()),
                    };
                    tracing::info!(identity = %id, index = head.index, head = %head.id, "config committed");
                    Some(head)
                }
                Err(e) => {
                    // withdraw the ballot so the owner can retry
                    storage.votes.remove(signer);
                    return Err(e);
                }
            }
        } else {
            None
        };

        let roster = storage.roster().to_vec();
        drop(storage);

        if let Ok(report) = self
            .relay(
                &roster,
                IdentityMessage::Vote {
                    id,
                    signer: signer.to_string(),
                    signature,
                },
            )
            .await
        {
            tracing::debug!(identity = %id, signer, peers = report.delivered.len(), "ballot relayed");
        }
        if let Some(head) = &head {
            if let Ok(report) = self
                .relay(&roster, IdentityMessage::UpdateSkipBlock { id })
                .await
            {
                tracing::debug!(identity = %id, index = head.index, peers = report.delivered.len(), "head announced");
            }
        }
        Ok(head)
    }

    /// Fan `message` out to the roster, logging peers that missed it.
    async fn relay(
        &self,
        roster: &[NodeId],
        message: IdentityMessage,
    ) -> std::result::Result<PropagationReport, PropagationError> {
        let outcome = replicate(&self.transport, roster, &message, &self.config.propagation()).await;
        if let Err(e) = &outcome {
            tracing::warn!(
                identity = %message.identity(),
                kind = message.kind(),
                error = %e,
                "propagation incomplete"
            );
        }
        outcome
    }

    /// Run a ledger call under the configured timeout.
    async fn ledger_call<R>(
        &self,
        op: &'static str,
        call: impl Future<Output = keyring_ledger::Result<R>>,
    ) -> Result<R> {
        let timeout = self.config.ledger_timeout();
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Unavailable(format!(
                "{op} timed out after {timeout:?}"
            ))),
        };
        result.map_err(|e| {
            tracing::warn!(op, error = %e, "ledger call failed");
            KeyringError::LedgerUnavailable(e)
        })
    }
}
