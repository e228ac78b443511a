//! Identity replicas: one node's local view of an identity.
//!
//! A replica may lag behind the ledger. `latest` decides who may vote;
//! `proposed` and `votes` hold the round in progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::account::AccountList;
use crate::block::Block;
use crate::crypto::Ed25519Signature;
use crate::types::{IdentityId, NodeId};

/// Per-node replica of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityStorage {
    /// Hash of the genesis data block.
    pub id: IdentityId,

    /// Last committed account list.
    pub latest: AccountList,

    /// Account list awaiting ballots.
    pub proposed: Option<AccountList>,

    /// Ballots for `proposed`: `Some` approves, `None` rejects.
    pub votes: BTreeMap<String, Option<Ed25519Signature>>,

    /// Root block carrying the roster.
    pub root: Block,

    /// Newest data block this node knows about.
    pub data: Block,
}

impl IdentityStorage {
    /// Replica for a freshly created identity whose genesis block is `data`.
    pub fn new(latest: AccountList, root: Block, data: Block) -> Self {
        Self {
            id: IdentityId::from(data.id),
            latest,
            proposed: None,
            votes: BTreeMap::new(),
            root,
            data,
        }
    }

    /// Nodes replicating this identity.
    pub fn roster(&self) -> &[NodeId] {
        self.root.roster_nodes()
    }

    /// Install a new proposal, discarding the previous round.
    pub fn install_proposal(&mut self, config: AccountList) {
        self.proposed = Some(config);
        self.votes.clear();
    }

    /// Whether `signer` already cast a ballot this round.
    pub fn has_voted(&self, signer: &str) -> bool {
        self.votes.contains_key(signer)
    }

    /// Number of approving ballots.
    pub fn approvals(&self) -> usize {
        self.votes.values().filter(|sig| sig.is_some()).count()
    }

    /// Approvals meet the threshold, or every owner has voted.
    pub fn quorum_reached(&self) -> bool {
        self.approvals() >= self.latest.threshold as usize || self.votes.len() == self.latest.len()
    }

    /// Apply a commit made by this node: `head` anchors the proposal.
    ///
    /// Returns the committed list, or `None` when there was no proposal.
    pub fn commit(&mut self, head: Block) -> Option<AccountList> {
        let committed = self.proposed.take()?;
        self.latest = committed.clone();
        self.votes.clear();
        self.data = head;
        Some(committed)
    }

    /// Anchor the proposal at `head` but leave the round open.
    ///
    /// Later ballots on the same proposal still land and may anchor it again.
    pub fn anchor(&mut self, head: Block) -> Option<AccountList> {
        let committed = self.proposed.clone()?;
        self.latest = committed.clone();
        self.data = head;
        Some(committed)
    }

    /// Move to a newer head learned from the ledger.
    ///
    /// The head's config becomes `latest`. A pending proposal equal to it
    /// has been committed elsewhere and is cleared.
    pub fn advance(&mut self, head: Block) -> bool {
        if head.id == self.data.id {
            return false;
        }
        if let Some(config) = head.config.clone() {
            if self.proposed.as_ref() == Some(&config) {
                self.proposed = None;
                self.votes.clear();
            }
            self.latest = config;
        }
        self.data = head;
        true
    }

    /// Move to a newer head learned from the ledger without closing the
    /// round. The counterpart of [`anchor`](Self::anchor) on other nodes.
    pub fn follow(&mut self, head: Block) -> bool {
        if head.id == self.data.id {
            return false;
        }
        if let Some(config) = head.config.clone() {
            self.latest = config;
        }
        self.data = head;
        true
    }
}
