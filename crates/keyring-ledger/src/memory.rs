//! In-memory implementation of the Ledger trait.
//!
//! One `MemoryLedger` behind an `Arc` plays the external ledger for a whole
//! in-process cluster. It enforces the same rules a real ledger would
//! (known roots, head-only appends, valid configs) and can be switched off
//! or slowed down to exercise failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

use keyring_core::{validate_account_list, AccountList, Block, BlockId, BlockKind, NodeId};

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// In-memory ledger.
///
/// All data is lost when the ledger is dropped.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
    available: AtomicBool,
    delay_ms: AtomicU64,
}

#[derive(Default)]
struct MemoryLedgerInner {
    /// Every block indexed by id.
    blocks: HashMap<BlockId, Block>,

    /// Root id to its data chain, oldest first.
    chains: HashMap<BlockId, Vec<BlockId>>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner::default()),
            available: AtomicBool::new(true),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Make every subsequent call fail with `Unavailable` (or recover).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Full data chain under `root`, oldest first.
    pub async fn history(&self, root: &BlockId) -> Result<Vec<Block>> {
        let inner = self.inner.read().await;
        let chain = inner.chains.get(root).ok_or(LedgerError::UnknownBlock(*root))?;
        inner.collect(chain)
    }

    /// Number of blocks stored, roots included.
    pub async fn block_count(&self) -> usize {
        self.inner.read().await.blocks.len()
    }

    async fn gate(&self) -> Result<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("ledger is offline".into()));
        }
        Ok(())
    }
}

impl MemoryLedgerInner {
    fn root(&self, root: &Block) -> Result<&Block> {
        match self.blocks.get(&root.id) {
            Some(block) if block.kind == BlockKind::Roster => Ok(block),
            _ => Err(LedgerError::UnknownBlock(root.id)),
        }
    }

    fn collect(&self, ids: &[BlockId]) -> Result<Vec<Block>> {
        ids.iter()
            .map(|id| self.blocks.get(id).cloned().ok_or(LedgerError::UnknownBlock(*id)))
            .collect()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn create_roster(&self, roster: &[NodeId]) -> Result<Block> {
        self.gate().await?;
        let block = Block::roster(roster.to_vec(), rand::thread_rng().gen());

        let mut inner = self.inner.write().await;
        inner.blocks.insert(block.id, block.clone());
        tracing::debug!(root = %block.id, peers = roster.len(), "anchored roster");
        Ok(block)
    }

    async fn create_data(&self, root: &Block, config: &AccountList) -> Result<(Block, Block)> {
        self.gate().await?;
        validate_account_list(config)?;

        let mut inner = self.inner.write().await;
        let root = inner.root(root)?.clone();
        if inner.chains.contains_key(&root.id) {
            return Err(LedgerError::ChainExists(root.id));
        }

        let genesis = Block::genesis_data(&root, config.clone());
        inner.blocks.insert(genesis.id, genesis.clone());
        inner.chains.insert(root.id, vec![genesis.id]);
        tracing::debug!(root = %root.id, genesis = %genesis.id, "seeded data chain");
        Ok((root, genesis))
    }

    async fn propose_data(
        &self,
        root: &Block,
        current: &Block,
        config: &AccountList,
    ) -> Result<Block> {
        self.gate().await?;
        validate_account_list(config)?;

        let mut inner = self.inner.write().await;
        inner.root(root)?;
        let head_id = inner
            .chains
            .get(&root.id)
            .and_then(|chain| chain.last().copied())
            .ok_or(LedgerError::UnknownBlock(root.id))?;
        if head_id != current.id {
            return Err(LedgerError::NotHead {
                head: head_id,
                extended: current.id,
            });
        }

        let head = inner
            .blocks
            .get(&head_id)
            .ok_or(LedgerError::UnknownBlock(head_id))?;
        let next = head.successor(config.clone());
        inner.blocks.insert(next.id, next.clone());
        if let Some(chain) = inner.chains.get_mut(&root.id) {
            chain.push(next.id);
        }
        tracing::debug!(root = %root.id, index = next.index, head = %next.id, "appended config");
        Ok(next)
    }

    async fn get_update_chain(&self, root: &Block, from: &BlockId) -> Result<Vec<Block>> {
        self.gate().await?;

        let inner = self.inner.read().await;
        inner.root(root)?;
        let chain = inner
            .chains
            .get(&root.id)
            .ok_or(LedgerError::UnknownBlock(root.id))?;
        let start = chain
            .iter()
            .position(|id| id == from)
            .ok_or(LedgerError::UnknownBlock(*from))?;
        inner.collect(&chain[start..])
    }
}
