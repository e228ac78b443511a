//! Error types for the identity service.

use keyring_core::{Blake3Hash, IdentityId, ValidationError};
use keyring_ledger::LedgerError;
use thiserror::Error;

/// Errors returned by identity service operations.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// No local replica of the identity.
    #[error("identity not found: {0}")]
    IdentityNotFound(IdentityId),

    /// The identity is already present on this node.
    #[error("identity already exists: {0}")]
    AlreadyExists(IdentityId),

    /// The ballot's signer is not an owner in the committed account list.
    #[error("unknown signer: {0}")]
    UnknownSigner(String),

    /// There is no proposal to vote on.
    #[error("no proposal pending for identity {0}")]
    NoProposal(IdentityId),

    /// The signer already voted on the current proposal.
    #[error("{0} already voted on the current proposal")]
    DuplicateVote(String),

    /// The ballot's signature does not cover the current proposal.
    #[error("invalid signature from {0}")]
    InvalidSignature(String),

    /// The account list breaks a structural rule.
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ValidationError),

    /// The proposal was built against a config that is no longer current.
    #[error("stale proposal: based on {base}, latest is {latest}")]
    StaleProposal { base: Blake3Hash, latest: Blake3Hash },

    /// Any ledger failure, including timeouts.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[from] LedgerError),

    /// An inbound peer message was rejected before dispatch.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for identity service operations.
pub type Result<T> = std::result::Result<T, KeyringError>;
