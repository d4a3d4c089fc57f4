// Ledger error taxonomy

use crate::wallet::KeyError;
use thiserror::Error;

/// Rejections returned by the ledger to its callers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("transaction signature verification failed")]
    InvalidSignature,

    #[error("sender {sender} is not the address of the signing key")]
    SenderKeyMismatch { sender: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: f32, required: f32 },

    /// Only possible if genesis was never created
    #[error("chain is empty")]
    EmptyChain,

    #[error("mining worker failed: {0}")]
    Worker(String),
}

impl From<KeyError> for LedgerError {
    fn from(err: KeyError) -> Self {
        LedgerError::MalformedRequest(err.to_string())
    }
}

/// Convenience alias used across the ledger
pub type Result<T> = std::result::Result<T, LedgerError>;
