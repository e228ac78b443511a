//! Strong identifier types for Keyring.
//!
//! All identifiers are 32-byte newtypes so a block id can never be passed
//! where a node id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id32 {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let mut arr = [0u8; 32];
                hex::decode_to_slice(s, &mut arr)?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.to_hex()[..16])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }
    };
}

id32!(
    /// Content address of a ledger block: Blake3 over its canonical bytes.
    BlockId,
    "BlockId"
);

id32!(
    /// An identity, named by the id of its genesis data block.
    IdentityId,
    "IdentityId"
);

id32!(
    /// A node that replicates identities.
    NodeId,
    "NodeId"
);

impl From<BlockId> for IdentityId {
    fn from(genesis: BlockId) -> Self {
        Self(genesis.0)
    }
}

impl NodeId {
    /// Generate a random node ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_hex_roundtrip() {
        let id = BlockId::from_bytes([0x42; 32]);
        let recovered = BlockId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(NodeId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_identity_id_from_genesis_block() {
        let genesis = BlockId::from_bytes([0x07; 32]);
        let id = IdentityId::from(genesis);
        assert_eq!(id.as_bytes(), genesis.as_bytes());
    }

    #[test]
    fn test_debug_carries_type_label() {
        let id = NodeId::from_bytes([0xcd; 32]);
        assert!(format!("{:?}", id).starts_with("NodeId("));
        assert_eq!(format!("{}", id), "cdcdcdcdcdcdcdcd");
    }
}
