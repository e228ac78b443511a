//! Ledger blocks: the hash-linked history of an identity.
//!
//! An identity owns two chains on the ledger. Its root block records the
//! roster of nodes allowed to replicate it; its data chain records every
//! committed [`AccountList`], each block linking back to its predecessor and
//! naming the root it descends from.

use serde::{Deserialize, Serialize};

use crate::account::AccountList;
use crate::canonical::canonical_block_bytes;
use crate::crypto::Blake3Hash;
use crate::types::{BlockId, NodeId};

/// Domain tag for block ids.
pub const BLOCK_DOMAIN: &[u8] = b"keyring-block-v0:";

/// What a block anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockKind {
    /// Root block carrying the replication roster.
    Roster = 0,
    /// Data block carrying a committed account list.
    Data = 1,
}

/// A single ledger block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Content address, computed over every other field.
    pub id: BlockId,

    /// Roster or data.
    pub kind: BlockKind,

    /// Position within its chain, 0 for the first block.
    pub index: u64,

    /// Previous block in the same chain.
    pub prev: Option<BlockId>,

    /// For data blocks, the root block this chain belongs to.
    pub root: Option<BlockId>,

    /// For roster blocks, the nodes replicating the identity.
    pub roster: Vec<NodeId>,

    /// For data blocks, the committed configuration.
    pub config: Option<AccountList>,

    /// Ledger-chosen salt so identical rosters still get distinct roots.
    pub salt: u64,
}

impl Block {
    /// Build a root block for `roster`.
    pub fn roster(roster: Vec<NodeId>, salt: u64) -> Self {
        Self::sealed(Self {
            id: BlockId::from_bytes([0; 32]),
            kind: BlockKind::Roster,
            index: 0,
            prev: None,
            root: None,
            roster,
            config: None,
            salt,
        })
    }

    /// Build the genesis data block under `root`.
    pub fn genesis_data(root: &Block, config: AccountList) -> Self {
        Self::sealed(Self {
            id: BlockId::from_bytes([0; 32]),
            kind: BlockKind::Data,
            index: 0,
            prev: None,
            root: Some(root.id),
            roster: Vec::new(),
            config: Some(config),
            salt: 0,
        })
    }

    /// Build the data block that follows `self` with `config`.
    pub fn successor(&self, config: AccountList) -> Self {
        Self::sealed(Self {
            id: BlockId::from_bytes([0; 32]),
            kind: BlockKind::Data,
            index: self.index + 1,
            prev: Some(self.id),
            root: self.root,
            roster: Vec::new(),
            config: Some(config),
            salt: 0,
        })
    }

    fn sealed(mut block: Self) -> Self {
        block.id = block.compute_id();
        block
    }

    /// Recompute the content address from the block's fields.
    pub fn compute_id(&self) -> BlockId {
        let hash = Blake3Hash::hash_with_domain(BLOCK_DOMAIN, &canonical_block_bytes(self));
        BlockId::from_bytes(hash.0)
    }

    /// Whether this data block belongs to the chain anchored at `root`.
    pub fn descends_from(&self, root: &Block) -> bool {
        self.kind == BlockKind::Data && self.root == Some(root.id)
    }

    /// Roster of a root block; empty for data blocks.
    pub fn roster_nodes(&self) -> &[NodeId] {
        &self.roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn config(threshold: u32) -> AccountList {
        AccountList::new(threshold).with_owner("o1", Keypair::from_seed(&[1; 32]).public_key())
    }

    #[test]
    fn test_chain_links() {
        let root = Block::roster(vec![NodeId::from_bytes([0xaa; 32])], 7);
        let genesis = Block::genesis_data(&root, config(1));
        let next = genesis.successor(config(1));

        assert!(genesis.descends_from(&root));
        assert!(next.descends_from(&root));
        assert_eq!(next.prev, Some(genesis.id));
        assert_eq!(next.index, 1);
        assert!(!root.descends_from(&root));
    }

    #[test]
    fn test_salt_separates_identical_rosters() {
        let roster = vec![NodeId::from_bytes([1; 32])];
        let a = Block::roster(roster.clone(), 1);
        let b = Block::roster(roster, 2);
        assert_ne!(a.id, b.id);
        assert_ne!(
            Block::genesis_data(&a, config(1)).id,
            Block::genesis_data(&b, config(1)).id
        );
    }

    #[test]
    fn test_tampering_changes_id() {
        let root = Block::roster(vec![], 0);
        let mut genesis = Block::genesis_data(&root, config(1));
        assert_eq!(genesis.compute_id(), genesis.id);

        genesis.config = Some(config(2));
        assert_ne!(genesis.compute_id(), genesis.id);
    }
}
