// Block data structure

use crate::core::{Hash256, Transaction, sha256};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Block - seals an ordered batch of transactions onto the previous block
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    /// Creation instant (Unix epoch, nanoseconds)
    timestamp: i64,
    /// Proof-of-work solution
    nonce: u64,
    /// Hash of the previous block
    #[serde(rename = "previousHash")]
    previous_hash: Hash256,
    /// Transactions in pool order at sealing time
    transactions: Vec<Transaction>,
}

/// Hashed view of a block; field order is part of the hash
#[derive(Serialize)]
struct BlockContent<'a> {
    timestamp: i64,
    nonce: u64,
    #[serde(rename = "previousHash")]
    previous_hash: &'a Hash256,
    /// `null` only for the zero-valued block, which has no transaction list at all
    transactions: Option<&'a [Transaction]>,
}

impl Block {
    /// Create a new block stamped with the current time
    pub fn new(nonce: u64, previous_hash: Hash256, transactions: Vec<Transaction>) -> Self {
        Self::with_timestamp(now_nanos(), nonce, previous_hash, transactions)
    }

    /// Create a block at a fixed instant
    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: Hash256,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The empty zero-valued block. Its hash is the genesis block's previous hash.
    pub fn zero() -> Self {
        Self::with_timestamp(0, 0, Hash256::zero(), Vec::new())
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &Hash256 {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Canonical JSON encoding of the four block fields
    pub fn canonical_bytes(&self) -> Vec<u8> {
        encode_content(self.timestamp, self.nonce, &self.previous_hash, &self.transactions)
    }

    /// SHA256 of the canonical encoding. Recomputed on every call.
    pub fn hash(&self) -> Hash256 {
        sha256(&self.canonical_bytes())
    }

    /// Hash of the block these fields would make, without building it
    pub fn compute_hash(
        timestamp: i64,
        nonce: u64,
        previous_hash: &Hash256,
        transactions: &[Transaction],
    ) -> Hash256 {
        sha256(&encode_content(timestamp, nonce, previous_hash, transactions))
    }

    /// Check if this block links to the zero block
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == Block::zero().hash()
    }
}

/// Blocks leave the engine with their hash attached
impl Serialize for Block {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Block", 5)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("nonce", &self.nonce)?;
        state.serialize_field("previousHash", &self.previous_hash)?;
        state.serialize_field("hash", &self.hash())?;
        state.serialize_field("transactions", &self.transactions)?;
        state.end()
    }
}

fn encode_content(
    timestamp: i64,
    nonce: u64,
    previous_hash: &Hash256,
    transactions: &[Transaction],
) -> Vec<u8> {
    let zero_valued =
        timestamp == 0 && nonce == 0 && *previous_hash == Hash256::zero() && transactions.is_empty();

    let content = BlockContent {
        timestamp,
        nonce,
        previous_hash,
        transactions: (!zero_valued).then_some(transactions),
    };
    // Integers, a hex string and plain transactions; serde_json cannot fail on them
    serde_json::to_vec(&content).expect("block serializes to JSON")
}

/// Current time in Unix nanoseconds
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}
