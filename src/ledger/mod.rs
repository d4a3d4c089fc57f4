// Ledger: chain, pool, admission and mining

mod blockchain;
mod error;
mod request;
mod service;

pub use blockchain::{Ledger, MineOutcome};
pub use error::{LedgerError, Result};
pub use request::{
    AmountResponse, ChainResponse, PoolResponse, StatusResponse, TransactionRequest,
    ValidatedRequest,
};
pub use service::LedgerService;
