//! Account lists: the versioned configuration of an identity.
//!
//! An account list maps owner names to their public keys and carries the
//! number of approving ballots needed to replace it. Lists are content
//! addressed; the hash doubles as the digest owners sign when voting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_account_list_bytes;
use crate::crypto::{Blake3Hash, Ed25519PublicKey};

/// Domain tag for account list hashes.
pub const ACCOUNT_LIST_DOMAIN: &[u8] = b"keyring-account-list-v0:";

/// A named set of owner credentials plus an approval threshold.
///
/// Owners are kept in a `BTreeMap`, so names are unique and iteration order
/// is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountList {
    /// Owner name to public key.
    pub owners: BTreeMap<String, Ed25519PublicKey>,

    /// Minimum number of approving owners.
    pub threshold: u32,
}

impl AccountList {
    /// Create an empty list with the given threshold.
    pub fn new(threshold: u32) -> Self {
        Self {
            owners: BTreeMap::new(),
            threshold,
        }
    }

    /// Builder-style owner insertion. A repeated name replaces the key.
    pub fn with_owner(mut self, name: impl Into<String>, key: Ed25519PublicKey) -> Self {
        self.owners.insert(name.into(), key);
        self
    }

    /// Look up an owner's key.
    pub fn owner(&self, name: &str) -> Option<&Ed25519PublicKey> {
        self.owners.get(name)
    }

    /// Check whether `name` is an owner.
    pub fn is_owner(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Number of owners.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// True when there are no owners.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Content hash over the canonical encoding.
    pub fn hash(&self) -> Blake3Hash {
        Blake3Hash::hash_with_domain(ACCOUNT_LIST_DOMAIN, &canonical_account_list_bytes(self))
    }
}
