//! Validation of account lists and ledger blocks.

use crate::account::AccountList;
use crate::block::{Block, BlockKind};
use crate::error::ValidationError;

/// Validate an account list before it is proposed or anchored.
///
/// - At least one owner
/// - No empty owner names
/// - `1 <= threshold <= owners`
pub fn validate_account_list(list: &AccountList) -> Result<(), ValidationError> {
    if list.is_empty() {
        return Err(ValidationError::NoOwners);
    }
    if list.owners.keys().any(|name| name.is_empty()) {
        return Err(ValidationError::EmptyOwnerName);
    }
    if list.threshold == 0 || list.threshold as usize > list.len() {
        return Err(ValidationError::ThresholdOutOfRange {
            threshold: list.threshold,
            owners: list.len(),
        });
    }
    Ok(())
}

/// Validate a single block in isolation.
///
/// Checks the content address and the fields each kind must (not) carry.
pub fn validate_block(block: &Block) -> Result<(), ValidationError> {
    let computed = block.compute_id();
    if computed != block.id {
        return Err(ValidationError::BlockIdMismatch {
            recorded: block.id,
            computed,
        });
    }

    match block.kind {
        BlockKind::Roster => {
            if block.index != 0 || block.prev.is_some() {
                return Err(ValidationError::StructuralError(
                    "roster block must be the first of its chain".into(),
                ));
            }
            if block.config.is_some() || block.root.is_some() {
                return Err(ValidationError::StructuralError(
                    "roster block carries no config".into(),
                ));
            }
        }
        BlockKind::Data => {
            let config = block.config.as_ref().ok_or_else(|| {
                ValidationError::StructuralError("data block without config".into())
            })?;
            validate_account_list(config)?;
            if block.root.is_none() {
                return Err(ValidationError::StructuralError(
                    "data block without root".into(),
                ));
            }
            if (block.index == 0) != block.prev.is_none() {
                return Err(ValidationError::StructuralError(
                    "only the genesis data block may omit prev".into(),
                ));
            }
        }
    }

    Ok(())
}

/// Validate that `next` directly follows `prev` in the same data chain.
pub fn validate_successor(prev: &Block, next: &Block) -> Result<(), ValidationError> {
    if next.kind != BlockKind::Data {
        return Err(ValidationError::UnexpectedKind(next.id));
    }
    if next.root != prev.root {
        return Err(ValidationError::ForeignRoot {
            block: next.id,
            root: prev.root.unwrap_or(prev.id),
        });
    }
    if next.index != prev.index + 1 {
        return Err(ValidationError::InvalidIndex {
            expected: prev.index + 1,
            got: next.index,
        });
    }
    if next.prev != Some(prev.id) {
        return Err(ValidationError::InvalidBackLink {
            expected: Some(prev.id),
            got: next.prev,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::NodeId;

    fn owners(n: u8, threshold: u32) -> AccountList {
        (1..=n).fold(AccountList::new(threshold), |list, i| {
            list.with_owner(format!("o{i}"), Keypair::from_seed(&[i; 32]).public_key())
        })
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(validate_account_list(&owners(2, 2)).is_ok());
        assert_eq!(
            validate_account_list(&owners(2, 3)),
            Err(ValidationError::ThresholdOutOfRange { threshold: 3, owners: 2 })
        );
        assert!(validate_account_list(&owners(2, 0)).is_err());
        assert_eq!(validate_account_list(&owners(0, 0)), Err(ValidationError::NoOwners));
    }

    #[test]
    fn test_empty_owner_name_rejected() {
        let list = AccountList::new(1).with_owner("", Keypair::from_seed(&[1; 32]).public_key());
        assert_eq!(validate_account_list(&list), Err(ValidationError::EmptyOwnerName));
    }

    #[test]
    fn test_block_validation() {
        let root = Block::roster(vec![NodeId::from_bytes([1; 32])], 3);
        let genesis = Block::genesis_data(&root, owners(2, 1));
        let next = genesis.successor(owners(3, 2));

        assert!(validate_block(&root).is_ok());
        assert!(validate_block(&genesis).is_ok());
        assert!(validate_successor(&genesis, &next).is_ok());
        assert!(validate_successor(&next, &genesis).is_err());
    }

    #[test]
    fn test_tampered_block_rejected() {
        let root = Block::roster(vec![], 0);
        let mut genesis = Block::genesis_data(&root, owners(2, 1));
        genesis.index = 5;
        assert!(matches!(
            validate_block(&genesis),
            Err(ValidationError::BlockIdMismatch { .. })
        ));
    }
}
