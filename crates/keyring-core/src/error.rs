//! Error types for Keyring Core.

use thiserror::Error;

use crate::types::BlockId;

/// Core errors raised by key handling and encoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Validation errors for account lists and ledger blocks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("account list has no owners")]
    NoOwners,

    #[error("owner name must not be empty")]
    EmptyOwnerName,

    #[error("threshold {threshold} is out of range for {owners} owners")]
    ThresholdOutOfRange { threshold: u32, owners: usize },

    #[error("block id mismatch: recorded {recorded}, computed {computed}")]
    BlockIdMismatch { recorded: BlockId, computed: BlockId },

    #[error("block {0} has the wrong kind for this position")]
    UnexpectedKind(BlockId),

    #[error("data block {block} does not belong to root {root}")]
    ForeignRoot { block: BlockId, root: BlockId },

    #[error("invalid block index: expected {expected}, got {got}")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("invalid back link: expected {expected:?}, got {got:?}")]
    InvalidBackLink {
        expected: Option<BlockId>,
        got: Option<BlockId>,
    },

    #[error("structural error: {0}")]
    StructuralError(String),
}
