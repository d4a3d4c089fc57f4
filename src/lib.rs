// Educational single-node ledger
// In-memory chain, signed transfers, proof-of-work sealing

pub mod core;
pub mod consensus;
pub mod config;
pub mod ledger;
pub mod wallet;
pub mod cli;

// Re-exports for convenience
pub use core::{Block, Hash256, Transaction, SYSTEM_REWARD_SENDER};
pub use consensus::{CancelToken, ChainValidator, Miner, ValidationError};
pub use config::{BalancePolicy, LedgerConfig};
pub use ledger::{Ledger, LedgerError, LedgerService, MineOutcome};
pub use wallet::{Address, KeyPair, TransactionSignature};
pub use cli::{Cli, CliHandler};
