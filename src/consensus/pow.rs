// Proof of Work implementation

use crate::core::{Block, Hash256, Transaction};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How many nonces are tried between cancellation checks
pub const CANCEL_POLL_INTERVAL: u64 = 1_024;

/// Number of leading zero hex digits a block hash must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difficulty(pub usize);

impl Difficulty {
    /// Hex rendering of `hash` starts with this many '0' characters
    pub fn is_met_by(&self, hash: &Hash256) -> bool {
        hash.leading_zero_nibbles() >= self.0
    }

    /// Expected number of attempts (16^difficulty)
    pub fn expected_attempts(&self) -> f64 {
        16f64.powi(self.0 as i32)
    }
}

/// Pure proof predicate: would a block built from these fields meet `difficulty`?
pub fn valid_proof(
    timestamp: i64,
    nonce: u64,
    previous_hash: &Hash256,
    transactions: &[Transaction],
    difficulty: usize,
) -> bool {
    let hash = Block::compute_hash(timestamp, nonce, previous_hash, transactions);
    Difficulty(difficulty).is_met_by(&hash)
}

/// Cooperative cancellation flag shared with a running search
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Proof of Work miner
pub struct Miner {
    /// Fixed difficulty target
    pub difficulty: Difficulty,
}

impl Miner {
    /// Create a new miner with fixed difficulty
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty: Difficulty(difficulty),
        }
    }

    /// Search nonces from 0 upward for a block over `transactions` at `timestamp`.
    ///
    /// The timestamp is pinned for the whole search so the block built from the
    /// result hashes to exactly the hash that was found. Blocks the calling
    /// thread until a nonce is found or `cancel` fires.
    pub fn mine(
        &self,
        timestamp: i64,
        previous_hash: &Hash256,
        transactions: &[Transaction],
        cancel: &CancelToken,
    ) -> MiningResult {
        let start_time = Instant::now();
        let mut attempts = 0u64;

        for nonce in 0..=u64::MAX {
            if nonce % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
                log::info!("Mining cancelled after {} attempts", attempts);
                break;
            }

            let hash = Block::compute_hash(timestamp, nonce, previous_hash, transactions);
            attempts += 1;

            if self.difficulty.is_met_by(&hash) {
                return MiningResult {
                    success: true,
                    timestamp,
                    nonce,
                    hash,
                    attempts,
                    duration: start_time.elapsed(),
                };
            }

            // Progress indicator every 100k attempts
            if attempts % 100_000 == 0 {
                let elapsed = start_time.elapsed();
                log::debug!("Mining attempts: {} ({:.1} KH/s)",
                    attempts,
                    attempts as f64 / elapsed.as_secs_f64() / 1000.0
                );
            }
        }

        MiningResult {
            success: false,
            timestamp,
            nonce: 0,
            hash: Hash256::zero(),
            attempts,
            duration: start_time.elapsed(),
        }
    }

    /// Verify that a block satisfies PoW
    pub fn verify(&self, block: &Block) -> bool {
        self.difficulty.is_met_by(&block.hash())
    }
}

/// Mining result
#[derive(Debug, Clone)]
pub struct MiningResult {
    /// Whether a nonce was found (false only when cancelled)
    pub success: bool,
    /// Timestamp the search was pinned to
    pub timestamp: i64,
    /// The nonce that was found
    pub nonce: u64,
    /// The resulting hash
    pub hash: Hash256,
    /// Number of attempts
    pub attempts: u64,
    /// Time taken
    pub duration: Duration,
}

impl MiningResult {
    /// Calculate hash rate (hashes per second)
    pub fn hash_rate(&self) -> f64 {
        self.attempts as f64 / self.duration.as_secs_f64()
    }
}
