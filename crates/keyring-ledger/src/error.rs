//! Error types for the ledger module.

use keyring_core::{BlockId, ValidationError};
use thiserror::Error;

/// Errors returned by ledger clients.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger could not be reached or refused service.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// A referenced block is not on the ledger.
    #[error("unknown block: {0}")]
    UnknownBlock(BlockId),

    /// The root already has a data chain.
    #[error("root {0} already anchors a data chain")]
    ChainExists(BlockId),

    /// An append named a block that is no longer the head.
    #[error("stale head: chain head is {head}, append extended {extended}")]
    NotHead { head: BlockId, extended: BlockId },

    /// A block or config failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An audited history is not a valid chain.
    #[error("broken chain at index {index}: {reason}")]
    BrokenChain { index: u64, reason: ValidationError },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
