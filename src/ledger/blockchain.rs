// In-memory chain, transaction pool and mining

use crate::config::{BalancePolicy, LedgerConfig};
use crate::consensus::{self, CancelToken, ChainValidator, Miner, MiningResult, ValidationError};
use crate::core::{now_nanos, Block, Hash256, Transaction};
use crate::ledger::{LedgerError, Result};
use crate::wallet::{self, Address, TransactionSignature};
use parking_lot::{Mutex, RwLock};
use secp256k1::PublicKey;

/// Outcome of one mining round
#[derive(Debug, Clone, PartialEq)]
pub enum MineOutcome {
    /// A block was appended
    Sealed(Block),
    /// Nothing pending; chain and pool untouched
    EmptyPool,
    /// The search was cancelled; chain and pool untouched
    Cancelled,
}

struct LedgerState {
    chain: Vec<Block>,
    pool: Vec<Transaction>,
}

/// Pool contents frozen for one proof-of-work search
struct PoolSnapshot {
    previous_hash: Hash256,
    /// Reward first, then the re-minted pool
    transactions: Vec<Transaction>,
    /// How many pool entries the snapshot covers
    pooled: usize,
}

/// The ledger: sole owner and writer of the chain and the pool.
///
/// Chain and pool share one lock so readers always see them consistently.
/// `mining` serializes everything that appends blocks; the nonce search runs
/// without holding the state lock, so admissions and reads proceed meanwhile.
pub struct Ledger {
    state: RwLock<LedgerState>,
    mining: Mutex<()>,
    owner_address: String,
    config: LedgerConfig,
}

impl Ledger {
    /// Create a ledger holding only the genesis block
    pub fn new(owner_address: impl Into<String>, config: LedgerConfig) -> Self {
        let genesis = Block::new(0, Block::zero().hash(), Vec::new());
        let owner_address = owner_address.into();

        log::info!(
            "Ledger created: owner={}, difficulty={}, reward={}, balance_policy={:?}",
            owner_address, config.difficulty, config.reward, config.balance_policy
        );

        Self {
            state: RwLock::new(LedgerState {
                chain: vec![genesis],
                pool: Vec::new(),
            }),
            mining: Mutex::new(()),
            owner_address,
            config,
        }
    }

    pub fn owner_address(&self) -> &str {
        &self.owner_address
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn reward(&self) -> f32 {
        self.config.reward
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Seal the whole pool into a new block at the current instant
    pub fn create_block(&self, nonce: u64, previous_hash: Hash256) -> Block {
        let _mining = self.mining.lock();

        let mut state = self.state.write();
        let transactions = std::mem::take(&mut state.pool);
        let block = Block::new(nonce, previous_hash, transactions);
        state.chain.push(block.clone());
        block
    }

    /// Verify and admit a transaction into the pool.
    ///
    /// The value must be a finite, non-negative amount. The system reward
    /// sender needs neither key nor signature; every other sender must be the
    /// address derived from the key that signed.
    pub fn add_transaction(
        &self,
        sender: &str,
        recipient: &str,
        value: f32,
        sender_public_key: Option<&PublicKey>,
        signature: Option<&TransactionSignature>,
    ) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            log::warn!("Rejected transaction from {}: invalid value {}", sender, value);
            return Err(LedgerError::MalformedRequest(format!(
                "value must be a non-negative amount, got {}",
                value
            )));
        }

        let transaction = Transaction::new(sender, recipient, value);

        if transaction.is_reward() {
            self.state.write().pool.push(transaction);
            return Ok(());
        }

        let public_key = sender_public_key
            .ok_or_else(|| LedgerError::MalformedRequest("missing sender public key".to_string()))?;
        let signature = signature
            .ok_or_else(|| LedgerError::MalformedRequest("missing signature".to_string()))?;

        if Address::from_public_key(public_key).as_str() != sender {
            log::warn!("Rejected transaction from {}: signed by another key", sender);
            return Err(LedgerError::SenderKeyMismatch {
                sender: sender.to_string(),
            });
        }

        if !wallet::verify(public_key, signature, &transaction.canonical_bytes()) {
            log::warn!("Rejected transaction from {}: invalid signature", sender);
            return Err(LedgerError::InvalidSignature);
        }

        let mut state = self.state.write();
        if self.config.balance_policy == BalancePolicy::Enforced {
            let available = balance_of(&state.chain, sender);
            if available < value {
                log::warn!("Rejected transaction from {}: balance {} < {}", sender, available, value);
                return Err(LedgerError::InsufficientBalance {
                    available,
                    required: value,
                });
            }
        }

        log::debug!("Admitted transaction {} -> {} ({})", sender, recipient, value);
        state.pool.push(transaction);
        Ok(())
    }

    /// Pure proof predicate, see [`consensus::valid_proof`]
    pub fn valid_proof(
        timestamp: i64,
        nonce: u64,
        previous_hash: &Hash256,
        transactions: &[Transaction],
        difficulty: usize,
    ) -> bool {
        consensus::valid_proof(timestamp, nonce, previous_hash, transactions, difficulty)
    }

    /// Run the nonce search over the current pool without sealing anything
    pub fn proof_of_work(&self) -> MiningResult {
        let snapshot = self.snapshot_pool();
        self.search(&snapshot, &CancelToken::new())
    }

    /// One mining round. Returns whether a block was sealed.
    pub fn mine(&self) -> bool {
        match self.mine_with_cancel(&CancelToken::new()) {
            Ok(MineOutcome::Sealed(_)) => true,
            Ok(_) => false,
            Err(e) => {
                log::error!("Mining failed: {}", e);
                false
            }
        }
    }

    /// One mining round that gives up when `cancel` fires
    pub fn mine_with_cancel(&self, cancel: &CancelToken) -> Result<MineOutcome> {
        let _mining = self.mining.lock();

        let snapshot = {
            let state = self.state.read();
            if state.pool.is_empty() {
                log::info!("action=mining, status=skipped, reason=empty pool");
                return Ok(MineOutcome::EmptyPool);
            }
            self.snapshot_of(&state)?
        };

        let result = self.search(&snapshot, cancel);
        if !result.success {
            return Ok(MineOutcome::Cancelled);
        }

        let block = {
            let mut state = self.state.write();
            let previous_hash = state
                .chain
                .last()
                .map(Block::hash)
                .ok_or(LedgerError::EmptyChain)?;
            // Appending requires the mining lock we hold, so the tip cannot have moved
            debug_assert_eq!(previous_hash, snapshot.previous_hash);

            let block = Block::with_timestamp(
                result.timestamp,
                result.nonce,
                previous_hash,
                snapshot.transactions,
            );
            state.chain.push(block.clone());
            state.pool.drain(..snapshot.pooled);
            block
        };

        log::info!(
            "action=mining, status=success, height={}, nonce={}, attempts={}, hash={}",
            self.chain_len() - 1, result.nonce, result.attempts, result.hash
        );
        Ok(MineOutcome::Sealed(block))
    }

    /// Sum of credits minus debits over sealed blocks; the pool is not counted
    pub fn derive_balance(&self, address: &str) -> f32 {
        balance_of(&self.state.read().chain, address)
    }

    pub fn last_block(&self) -> Result<Block> {
        self.state.read().chain.last().cloned().ok_or(LedgerError::EmptyChain)
    }

    /// Copy of the chain
    pub fn chain(&self) -> Vec<Block> {
        self.state.read().chain.clone()
    }

    /// Copy of the pending pool
    pub fn pool(&self) -> Vec<Transaction> {
        self.state.read().pool.clone()
    }

    /// Chain and pool read under the same lock
    pub fn snapshot(&self) -> (Vec<Block>, Vec<Transaction>) {
        let state = self.state.read();
        (state.chain.clone(), state.pool.clone())
    }

    pub fn chain_len(&self) -> usize {
        self.state.read().chain.len()
    }

    pub fn pool_len(&self) -> usize {
        self.state.read().pool.len()
    }

    /// Check linkage and proof of work of every block after genesis
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        ChainValidator::new(self.config.difficulty).validate_chain(&self.state.read().chain)
    }

    fn snapshot_pool(&self) -> PoolSnapshot {
        let state = self.state.read();
        // Genesis exists from construction on
        self.snapshot_of(&state).unwrap_or_else(|_| PoolSnapshot {
            previous_hash: Block::zero().hash(),
            transactions: vec![self.reward_transaction()],
            pooled: 0,
        })
    }

    fn snapshot_of(&self, state: &LedgerState) -> Result<PoolSnapshot> {
        let previous_hash = state.chain.last().map(Block::hash).ok_or(LedgerError::EmptyChain)?;

        // Fresh copies so the search never aliases the live pool
        let mut transactions = Vec::with_capacity(state.pool.len() + 1);
        transactions.push(self.reward_transaction());
        transactions.extend(
            state
                .pool
                .iter()
                .map(|tx| Transaction::new(tx.sender(), tx.recipient(), tx.value())),
        );

        Ok(PoolSnapshot {
            previous_hash,
            transactions,
            pooled: state.pool.len(),
        })
    }

    fn reward_transaction(&self) -> Transaction {
        Transaction::reward(self.owner_address.as_str(), self.config.reward)
    }

    fn search(&self, snapshot: &PoolSnapshot, cancel: &CancelToken) -> MiningResult {
        Miner::new(self.config.difficulty).mine(
            now_nanos(),
            &snapshot.previous_hash,
            &snapshot.transactions,
            cancel,
        )
    }
}

fn balance_of(chain: &[Block], address: &str) -> f32 {
    let mut total = 0.0f32;
    for transaction in chain.iter().flat_map(|block| block.transactions()) {
        if transaction.recipient() == address {
            total += transaction.value();
        }
        if transaction.sender() == address {
            total -= transaction.value();
        }
    }
    total
}
