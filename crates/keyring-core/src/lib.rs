//! # Keyring Core
//!
//! Pure primitives for Keyring: account lists, ledger blocks, and
//! canonicalization.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`AccountList`] - Named owner keys plus an approval threshold
//! - [`Block`] - A hash-linked ledger block (roster or data)
//! - [`IdentityId`] - Identifier of an identity (hash of its genesis data block)
//! - [`NodeId`] - Identifier of a node that replicates identities
//! - [`IdentityStorage`] - One node's replica of an identity
//!
//! ## Canonicalization
//!
//! Everything that is hashed or signed is encoded using deterministic CBOR.
//! See the [`canonical`] module.

pub mod account;
pub mod block;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod types;
pub mod validation;

pub use account::AccountList;
pub use block::{Block, BlockKind};
pub use canonical::{canonical_account_list_bytes, canonical_block_bytes};
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::{CoreError, ValidationError};
pub use identity::IdentityStorage;
pub use types::{BlockId, IdentityId, NodeId};
pub use validation::{validate_account_list, validate_block, validate_successor};
