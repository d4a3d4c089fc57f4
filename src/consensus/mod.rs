// Proof of work and chain validation

pub mod pow;
pub mod validation;

pub use pow::{valid_proof, CancelToken, Difficulty, Miner, MiningResult, CANCEL_POLL_INTERVAL};
pub use validation::{ChainValidator, ValidationError};
