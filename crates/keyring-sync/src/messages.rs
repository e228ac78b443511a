//! Wire messages exchanged between identity replicas.
//!
//! Each variant mirrors one inbound handler of the identity service. On the
//! wire a message travels inside a versioned CBOR frame.

use serde::{Deserialize, Serialize};

use keyring_core::{AccountList, Ed25519Signature, IdentityId, IdentityStorage};

use crate::error::{Result, SyncError};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 0;

/// Message size limits.
pub mod limits {
    /// Max owners in any account list carried by a message.
    pub const MAX_OWNERS: usize = 1024;
    /// Max length of an owner name, in bytes.
    pub const MAX_OWNER_NAME: usize = 256;
    /// Max ballots in a propagated replica.
    pub const MAX_VOTES: usize = MAX_OWNERS;
    /// Max roster size.
    pub const MAX_ROSTER: usize = 1024;
}

/// Where a request entered the system.
///
/// Only client requests fan out to peers or commit to the ledger; a message
/// relayed by a peer is applied locally and goes no further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Called directly by a client.
    Client,
    /// Relayed by another node in the roster.
    Peer,
}

/// Messages relayed between nodes holding the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityMessage {
    /// A full replica of a newly created identity.
    PropagateIdentity {
        /// The replica to install.
        storage: IdentityStorage,
    },

    /// A new proposed account list.
    ProposeConfig {
        /// Target identity.
        id: IdentityId,
        /// The proposal.
        config: AccountList,
    },

    /// A ballot on the current proposal.
    Vote {
        /// Target identity.
        id: IdentityId,
        /// Owner casting the ballot.
        signer: String,
        /// Approval signature, or `None` to reject.
        signature: Option<Ed25519Signature>,
    },

    /// The data chain advanced; fetch the new head from the ledger.
    UpdateSkipBlock {
        /// Target identity.
        id: IdentityId,
    },
}

/// Versioned wire frame.
#[derive(Serialize, Deserialize)]
struct Frame {
    version: u8,
    message: IdentityMessage,
}

impl IdentityMessage {
    /// The identity this message concerns.
    pub fn identity(&self) -> IdentityId {
        match self {
            IdentityMessage::PropagateIdentity { storage } => storage.id,
            IdentityMessage::ProposeConfig { id, .. }
            | IdentityMessage::Vote { id, .. }
            | IdentityMessage::UpdateSkipBlock { id } => *id,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IdentityMessage::PropagateIdentity { .. } => "propagate-identity",
            IdentityMessage::ProposeConfig { .. } => "propose-config",
            IdentityMessage::Vote { .. } => "vote",
            IdentityMessage::UpdateSkipBlock { .. } => "update-skipblock",
        }
    }

    /// Check if this message respects size limits.
    pub fn validate_limits(&self) -> std::result::Result<(), &'static str> {
        fn check_list(list: &AccountList) -> std::result::Result<(), &'static str> {
            if list.len() > limits::MAX_OWNERS {
                return Err("too many owners");
            }
            if list.owners.keys().any(|n| n.len() > limits::MAX_OWNER_NAME) {
                return Err("owner name too long");
            }
            Ok(())
        }

        match self {
            IdentityMessage::PropagateIdentity { storage } => {
                check_list(&storage.latest)?;
                if let Some(proposed) = &storage.proposed {
                    check_list(proposed)?;
                }
                if storage.votes.len() > limits::MAX_VOTES {
                    return Err("too many votes");
                }
                if storage.roster().len() > limits::MAX_ROSTER {
                    return Err("roster too large");
                }
            }
            IdentityMessage::ProposeConfig { config, .. } => check_list(config)?,
            IdentityMessage::Vote { signer, .. } => {
                if signer.len() > limits::MAX_OWNER_NAME {
                    return Err("signer name too long");
                }
            }
            IdentityMessage::UpdateSkipBlock { .. } => {}
        }
        Ok(())
    }

    /// Encode into a versioned CBOR frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let frame = Frame {
            version: PROTOCOL_VERSION,
            message: self.clone(),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&frame, &mut buf).map_err(|e| SyncError::Codec(e.to_string()))?;
        Ok(buf)
    }

    /// Decode a frame produced by [`IdentityMessage::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let frame: Frame =
            ciborium::from_reader(bytes).map_err(|e| SyncError::Codec(e.to_string()))?;
        if frame.version != PROTOCOL_VERSION {
            return Err(SyncError::VersionMismatch {
                local: PROTOCOL_VERSION,
                peer: frame.version,
            });
        }
        Ok(frame.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyring_core::{Block, Keypair, NodeId};

    fn config(owners: u8) -> AccountList {
        (1..=owners).fold(AccountList::new(1), |list, i| {
            list.with_owner(format!("o{i}"), Keypair::from_seed(&[i; 32]).public_key())
        })
    }

    fn replica() -> IdentityStorage {
        let root = Block::roster(vec![NodeId::from_bytes([1; 32])], 9);
        let genesis = Block::genesis_data(&root, config(2));
        IdentityStorage::new(config(2), root, genesis)
    }

    #[test]
    fn test_replica_survives_wire() {
        let mut storage = replica();
        storage.install_proposal(config(3));
        let sig = Keypair::from_seed(&[1; 32]).sign_config(&config(3));
        storage.votes.insert("o1".into(), Some(sig));
        storage.votes.insert("o2".into(), None);

        let msg = IdentityMessage::PropagateIdentity { storage };
        let decoded = IdentityMessage::from_bytes(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let frame = Frame {
            version: PROTOCOL_VERSION + 1,
            message: IdentityMessage::UpdateSkipBlock {
                id: IdentityId::from_bytes([0; 32]),
            },
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&frame, &mut buf).unwrap();
        assert!(matches!(
            IdentityMessage::from_bytes(&buf),
            Err(SyncError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            IdentityMessage::from_bytes(&[0xff, 0x00, 0x13]),
            Err(SyncError::Codec(_))
        ));
    }

    #[test]
    fn test_identity_of_message() {
        let storage = replica();
        let id = storage.id;
        assert_eq!(IdentityMessage::PropagateIdentity { storage }.identity(), id);
        assert_eq!(IdentityMessage::UpdateSkipBlock { id }.identity(), id);
    }

    #[test]
    fn test_message_limits() {
        let ok = IdentityMessage::Vote {
            id: IdentityId::from_bytes([0; 32]),
            signer: "o1".into(),
            signature: None,
        };
        assert!(ok.validate_limits().is_ok());

        let long = IdentityMessage::Vote {
            id: IdentityId::from_bytes([0; 32]),
            signer: "x".repeat(limits::MAX_OWNER_NAME + 1),
            signature: None,
        };
        assert!(long.validate_limits().is_err());
    }
}
