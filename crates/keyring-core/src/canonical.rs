//! Canonical CBOR encoding for deterministic hashing.
//!
//! This module implements RFC 8949 Core Deterministic Encoding for the
//! subset of CBOR Keyring hashes:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats or tags
//!
//! The same account list or block must produce identical bytes (and thus
//! identical ids and signature digests) on every node.

use ciborium::value::{Integer, Value};

use crate::account::AccountList;
use crate::block::Block;
use crate::error::CoreError;

/// Integer map keys. Keys 0-23 encode as single bytes.
mod keys {
    pub const LIST_THRESHOLD: u64 = 0;
    pub const LIST_OWNERS: u64 = 1;

    pub const BLOCK_KIND: u64 = 0;
    pub const BLOCK_INDEX: u64 = 1;
    pub const BLOCK_PREV: u64 = 2;
    pub const BLOCK_ROOT: u64 = 3;
    pub const BLOCK_ROSTER: u64 = 4;
    pub const BLOCK_CONFIG: u64 = 5;
    pub const BLOCK_SALT: u64 = 6;
}

/// The CBOR shapes Keyring hashes. Every variant has a canonical form, so
/// encoding one cannot fail.
enum Canon {
    Uint(u64),
    Int(Integer),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Canon>),
    Map(Vec<(Canon, Canon)>),
    Bool(bool),
    Null,
}

impl TryFrom<&Value> for Canon {
    type Error = CoreError;

    fn try_from(value: &Value) -> Result<Self, CoreError> {
        Ok(match value {
            Value::Integer(i) => Canon::Int(*i),
            Value::Bytes(b) => Canon::Bytes(b.clone()),
            Value::Text(t) => Canon::Text(t.clone()),
            Value::Array(items) => {
                Canon::Array(items.iter().map(Canon::try_from).collect::<Result<_, _>>()?)
            }
            Value::Map(entries) => Canon::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((Canon::try_from(k)?, Canon::try_from(v)?)))
                    .collect::<Result<_, CoreError>>()?,
            ),
            Value::Bool(b) => Canon::Bool(*b),
            Value::Null => Canon::Null,
            other => {
                return Err(CoreError::EncodingError(format!(
                    "no canonical form for {other:?}"
                )))
            }
        })
    }
}

/// Encode an account list to canonical CBOR bytes.
pub fn canonical_account_list_bytes(list: &AccountList) -> Vec<u8> {
    encode(&account_list_to_canon(list))
}

/// Encode a block, minus its own id, to canonical CBOR bytes.
pub fn canonical_block_bytes(block: &Block) -> Vec<u8> {
    encode(&block_to_canon(block))
}

/// Encode an arbitrary CBOR value canonically.
///
/// Fails on floats, tags, and other variants with no canonical form here.
pub fn try_encode_canonical(value: &Value) -> Result<Vec<u8>, CoreError> {
    Ok(encode(&Canon::try_from(value)?))
}

fn account_list_to_canon(list: &AccountList) -> Canon {
    let owners = list
        .owners
        .iter()
        .map(|(name, pk)| (Canon::Text(name.clone()), Canon::Bytes(pk.0.to_vec())))
        .collect();

    Canon::Map(vec![
        (Canon::Uint(keys::LIST_THRESHOLD), Canon::Uint(list.threshold.into())),
        (Canon::Uint(keys::LIST_OWNERS), Canon::Map(owners)),
    ])
}

fn block_to_canon(block: &Block) -> Canon {
    let optional_id = |id: &Option<crate::types::BlockId>| match id {
        Some(id) => Canon::Bytes(id.0.to_vec()),
        None => Canon::Null,
    };
    let roster = block.roster.iter().map(|n| Canon::Bytes(n.0.to_vec())).collect();
    let config = match &block.config {
        Some(list) => account_list_to_canon(list),
        None => Canon::Null,
    };

    Canon::Map(vec![
        (Canon::Uint(keys::BLOCK_KIND), Canon::Uint(block.kind as u64)),
        (Canon::Uint(keys::BLOCK_INDEX), Canon::Uint(block.index)),
        (Canon::Uint(keys::BLOCK_PREV), optional_id(&block.prev)),
        (Canon::Uint(keys::BLOCK_ROOT), optional_id(&block.root)),
        (Canon::Uint(keys::BLOCK_ROSTER), Canon::Array(roster)),
        (Canon::Uint(keys::BLOCK_CONFIG), config),
        (Canon::Uint(keys::BLOCK_SALT), Canon::Uint(block.salt)),
    ])
}

fn encode(value: &Canon) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value(&mut buf, value);
    buf
}

fn encode_value(buf: &mut Vec<u8>, value: &Canon) {
    match value {
        Canon::Uint(n) => encode_head(buf, 0, *n),
        Canon::Int(i) => encode_integer(buf, *i),
        Canon::Bytes(b) => {
            encode_head(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Canon::Text(s) => {
            encode_head(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Canon::Array(items) => {
            encode_head(buf, 4, items.len() as u64);
            for item in items {
                encode_value(buf, item);
            }
        }
        Canon::Map(entries) => encode_map(buf, entries),
        Canon::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Canon::Null => buf.push(0xf6),
    }
}

/// Major types 0 and 1. CBOR encodes -1 as 0, -2 as 1, and so on.
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();
    if n >= 0 {
        encode_head(buf, 0, n as u64);
    } else {
        encode_head(buf, 1, (-1 - n) as u64);
    }
}

/// Write a type/length head using the shortest argument width.
fn encode_head(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    match n {
        0..=23 => buf.push(mt | n as u8),
        24..=0xff => {
            buf.push(mt | 24);
            buf.push(n as u8);
        }
        0x100..=0xffff => {
            buf.push(mt | 25);
            buf.extend_from_slice(&(n as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(mt | 26);
            buf.extend_from_slice(&(n as u32).to_be_bytes());
        }
        _ => {
            buf.push(mt | 27);
            buf.extend_from_slice(&n.to_be_bytes());
        }
    }
}

/// Major type 5, keys sorted by their encoded bytes.
fn encode_map(buf: &mut Vec<u8>, entries: &[(Canon, Canon)]) {
    let mut encoded: Vec<(Vec<u8>, &Canon)> =
        entries.iter().map(|(k, v)| (encode(k), v)).collect();
    encoded.sort_by(|a, b| a.0.cmp(&b.0));

    encode_head(buf, 5, encoded.len() as u64);
    for (key_bytes, value) in encoded {
        buf.extend_from_slice(&key_bytes);
        encode_value(buf, value);
    }
}
