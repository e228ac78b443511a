//! Offline audit of an identity's history.
//!
//! Anyone holding an identity's root block and its data chain can check,
//! without trusting the nodes that served them, that the chain is intact:
//! every block id recomputes from content, every block hangs off the same
//! root, and each block links to the one before it.

use keyring_core::{validate_block, validate_successor, AccountList, Block, ValidationError};

use crate::error::{LedgerError, Result};

/// Verify a full data chain (genesis first) under `root`.
///
/// Returns the config of the newest block, i.e. the account list currently
/// in force.
pub fn verify_history(root: &Block, chain: &[Block]) -> Result<AccountList> {
    validate_block(root).map_err(|reason| LedgerError::BrokenChain { index: 0, reason })?;

    let genesis = chain.first().ok_or(LedgerError::BrokenChain {
        index: 0,
        reason: ValidationError::StructuralError("empty history".into()),
    })?;
    if genesis.index != 0 {
        return Err(LedgerError::BrokenChain {
            index: genesis.index,
            reason: ValidationError::InvalidIndex {
                expected: 0,
                got: genesis.index,
            },
        });
    }

    let mut prev: Option<&Block> = None;
    for block in chain {
        let broken = |reason: ValidationError| LedgerError::BrokenChain {
            index: block.index,
            reason,
        };
        validate_block(block).map_err(broken)?;
        if !block.descends_from(root) {
            return Err(broken(ValidationError::ForeignRoot {
                block: block.id,
                root: root.id,
            }));
        }
        if let Some(prev) = prev {
            validate_successor(prev, block).map_err(broken)?;
        }
        prev = Some(block);
    }

    // validate_block guarantees data blocks carry a config
    chain
        .last()
        .and_then(|head| head.config.clone())
        .ok_or(LedgerError::BrokenChain {
            index: 0,
            reason: ValidationError::StructuralError("head without config".into()),
        })
}

/// Verify a chain update fetched from `known` onwards under `root`.
///
/// The update must start at `known` and link forward block by block.
/// Returns the new head.
pub fn verify_update<'a>(root: &Block, known: &Block, update: &'a [Block]) -> Result<&'a Block> {
    let first = update.first().ok_or(LedgerError::UnknownBlock(known.id))?;
    if first.id != known.id {
        return Err(LedgerError::BrokenChain {
            index: first.index,
            reason: ValidationError::StructuralError(format!(
                "update starts at {}, expected {}",
                first.id, known.id
            )),
        });
    }

    for pair in update.windows(2) {
        let next = &pair[1];
        let broken = |reason: ValidationError| LedgerError::BrokenChain {
            index: next.index,
            reason,
        };
        validate_block(next).map_err(broken)?;
        if !next.descends_from(root) {
            return Err(broken(ValidationError::ForeignRoot {
                block: next.id,
                root: root.id,
            }));
        }
        validate_successor(&pair[0], next).map_err(broken)?;
    }

    update.last().ok_or(LedgerError::UnknownBlock(known.id))
}
