//! Ledger trait: the interface to the external hash-linked ledger.
//!
//! The identity service never builds or stores blocks itself. It asks the
//! ledger to anchor a roster, to seed a data chain, to append a committed
//! config, and to report what has been appended since a known block.

use std::sync::Arc;

use async_trait::async_trait;
use keyring_core::{AccountList, Block, BlockId, NodeId};

use crate::error::Result;

/// Async client for the identity ledger.
///
/// Implementations must be thread-safe; one client is shared by every
/// identity a node serves.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Anchor a new root block for `roster`.
    async fn create_roster(&self, roster: &[NodeId]) -> Result<Block>;

    /// Seed the data chain under `root` with `config`.
    ///
    /// Returns the (possibly refreshed) root and the genesis data block.
    async fn create_data(&self, root: &Block, config: &AccountList) -> Result<(Block, Block)>;

    /// Append `config` after `current`, which must be the chain head.
    async fn propose_data(
        &self,
        root: &Block,
        current: &Block,
        config: &AccountList,
    ) -> Result<Block>;

    /// Blocks of the data chain under `root` from `from` to the head,
    /// inclusive, newest last.
    async fn get_update_chain(&self, root: &Block, from: &BlockId) -> Result<Vec<Block>>;
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    async fn create_roster(&self, roster: &[NodeId]) -> Result<Block> {
        (**self).create_roster(roster).await
    }

    async fn create_data(&self, root: &Block, config: &AccountList) -> Result<(Block, Block)> {
        (**self).create_data(root, config).await
    }

    async fn propose_data(
        &self,
        root: &Block,
        current: &Block,
        config: &AccountList,
    ) -> Result<Block> {
        (**self).propose_data(root, current, config).await
    }

    async fn get_update_chain(&self, root: &Block, from: &BlockId) -> Result<Vec<Block>> {
        (**self).get_update_chain(root, from).await
    }
}
