// Chain integrity validation

use crate::consensus::pow::Miner;
use crate::core::Block;
use thiserror::Error;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Chain has no genesis block
    #[error("chain is empty")]
    EmptyChain,
    /// Genesis does not link to the zero block
    #[error("genesis block does not link to the zero block")]
    InvalidGenesis,
    /// previous_hash differs from the hash of the block before it
    #[error("block {height} does not link to its parent")]
    InvalidLinkage { height: usize },
    /// Block hash doesn't meet the difficulty target
    #[error("block {height} fails proof of work")]
    InvalidProofOfWork { height: usize },
    /// Block is older than its parent
    #[error("block {height} is older than its parent")]
    InvalidTimestamp { height: usize },
}

/// Block validator
pub struct ChainValidator {
    /// PoW miner for verification
    miner: Miner,
}

impl ChainValidator {
    /// Create a new validator with fixed difficulty
    pub fn new(difficulty: usize) -> Self {
        Self {
            miner: Miner::new(difficulty),
        }
    }

    /// Validate a block against its parent. `height` is only used for errors.
    pub fn validate_block(
        &self,
        block: &Block,
        parent: &Block,
        height: usize,
    ) -> Result<(), ValidationError> {
        if *block.previous_hash() != parent.hash() {
            return Err(ValidationError::InvalidLinkage { height });
        }

        if !self.miner.verify(block) {
            return Err(ValidationError::InvalidProofOfWork { height });
        }

        if block.timestamp() < parent.timestamp() {
            return Err(ValidationError::InvalidTimestamp { height });
        }

        Ok(())
    }

    /// Validate a whole chain. Genesis is exempt from proof of work.
    pub fn validate_chain(&self, chain: &[Block]) -> Result<(), ValidationError> {
        let genesis = chain.first().ok_or(ValidationError::EmptyChain)?;
        if !genesis.is_genesis() {
            return Err(ValidationError::InvalidGenesis);
        }

        for (height, pair) in chain.windows(2).enumerate() {
            self.validate_block(&pair[1], &pair[0], height + 1)?;
        }

        Ok(())
    }
}
