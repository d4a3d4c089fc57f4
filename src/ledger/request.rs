// Request and response shapes exchanged with the (external) HTTP layer

use crate::core::{Block, Transaction};
use crate::ledger::{Ledger, LedgerError, MineOutcome, Result};
use crate::wallet::{public_key_from_hex, public_key_to_hex, SignedTransfer, TransactionSignature};
use serde::{Deserialize, Serialize};

/// Transaction submission. Every field is optional on the wire so that
/// missing ones can be reported instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_blockchain_address: Option<String>,
    pub recipient_blockchain_address: Option<String>,
    pub sender_public_key: Option<String>,
    pub value: Option<f32>,
    pub signature: Option<String>,
}

/// A request with every field present
#[derive(Debug)]
pub struct ValidatedRequest<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
    pub sender_public_key: &'a str,
    pub value: f32,
    pub signature: &'a str,
}

impl TransactionRequest {
    /// Wallet side: turn a signed transfer into a submission
    pub fn from_signed(signed: &SignedTransfer) -> Self {
        Self {
            sender_blockchain_address: Some(signed.transaction.sender().to_string()),
            recipient_blockchain_address: Some(signed.transaction.recipient().to_string()),
            sender_public_key: Some(public_key_to_hex(&signed.sender_public_key)),
            value: Some(signed.transaction.value()),
            signature: Some(signed.signature.to_hex()),
        }
    }

    /// Check that no field is missing
    pub fn validate(&self) -> Result<ValidatedRequest<'_>> {
        fn required<'a, T: ?Sized>(field: Option<&'a T>, name: &str) -> Result<&'a T> {
            field.ok_or_else(|| LedgerError::MalformedRequest(format!("missing field `{}`", name)))
        }

        Ok(ValidatedRequest {
            sender: required(self.sender_blockchain_address.as_deref(), "sender_blockchain_address")?,
            recipient: required(
                self.recipient_blockchain_address.as_deref(),
                "recipient_blockchain_address",
            )?,
            sender_public_key: required(self.sender_public_key.as_deref(), "sender_public_key")?,
            value: *required(self.value.as_ref(), "value")?,
            signature: required(self.signature.as_deref(), "signature")?,
        })
    }
}

impl Ledger {
    /// Validate, decode and admit a submission
    pub fn submit(&self, request: &TransactionRequest) -> Result<()> {
        let fields = request.validate()?;
        let public_key = public_key_from_hex(fields.sender_public_key)?;
        let signature = TransactionSignature::from_hex(fields.signature)?;

        self.add_transaction(
            fields.sender,
            fields.recipient,
            fields.value,
            Some(&public_key),
            Some(&signature),
        )
    }
}

/// `{"status": "success"}` or `{"status": "fail", "reason": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

impl From<&Result<()>> for StatusResponse {
    fn from(result: &Result<()>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

impl From<&Result<MineOutcome>> for StatusResponse {
    fn from(result: &Result<MineOutcome>) -> Self {
        match result {
            Ok(MineOutcome::Sealed(_)) => Self::success(),
            Ok(MineOutcome::EmptyPool) => Self::fail("transaction pool is empty"),
            Ok(MineOutcome::Cancelled) => Self::fail("mining cancelled"),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

/// The whole chain
#[derive(Debug, Clone, Serialize)]
pub struct ChainResponse {
    pub chains: Vec<Block>,
}

impl ChainResponse {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self {
            chains: ledger.chain(),
        }
    }
}

/// Pending pool
#[derive(Debug, Clone, Serialize)]
pub struct PoolResponse {
    pub length: usize,
    pub transactions: Vec<Transaction>,
}

impl PoolResponse {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let transactions = ledger.pool();
        Self {
            length: transactions.len(),
            transactions,
        }
    }
}

/// Derived balance of one address
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountResponse {
    pub amount: f32,
}

impl AmountResponse {
    pub fn from_ledger(ledger: &Ledger, address: &str) -> Self {
        Self {
            amount: ledger.derive_balance(address),
        }
    }
}
