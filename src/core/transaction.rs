// Transaction data structure

use crate::core::{Hash256, sha256};
use serde::{Deserialize, Serialize};

/// Sender identity used for mining rewards; never signs anything
pub const SYSTEM_REWARD_SENDER: &str = "THE BLOCKCHAIN";

/// Value transfer between two addresses.
///
/// The serde field order is the canonical encoding that gets signed and hashed
/// into blocks, so the fields must not be reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "senderBlockchainAddress")]
    sender: String,
    #[serde(rename = "recipientBlockchainAddress")]
    recipient: String,
    #[serde(serialize_with = "serialize_amount")]
    value: f32,
}

/// Integral amounts are written without a fraction (`5`, not `5.0`), so the
/// signed bytes match wallets that print single-precision floats in plain
/// decimal. Everything else uses the shortest round-trip form.
fn serialize_amount<S: serde::Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        serializer.serialize_i128(*value as i128)
    } else {
        serializer.serialize_f32(*value)
    }
}

impl Transaction {
    /// Create a new transaction. No validation happens here.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, value: f32) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            value,
        }
    }

    /// Reward transaction crediting `recipient`
    pub fn reward(recipient: impl Into<String>, value: f32) -> Self {
        Self::new(SYSTEM_REWARD_SENDER, recipient, value)
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Check if this is a mining reward
    pub fn is_reward(&self) -> bool {
        self.sender == SYSTEM_REWARD_SENDER
    }

    /// Canonical JSON encoding
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Three plain fields; serde_json cannot fail on them
        serde_json::to_vec(self).expect("transaction serializes to JSON")
    }

    /// SHA256 of the canonical encoding (the signed message)
    pub fn digest(&self) -> Hash256 {
        sha256(&self.canonical_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_field_order() {
        let tx = Transaction::new("A", "B", 5.0);
        let json = String::from_utf8(tx.canonical_bytes()).unwrap();
        assert_eq!(
            json,
            r#"{"senderBlockchainAddress":"A","recipientBlockchainAddress":"B","value":5}"#
        );
    }

    #[test]
    fn test_amount_encoding() {
        let encode = |value: f32| {
            let json = String::from_utf8(Transaction::new("A", "B", value).canonical_bytes()).unwrap();
            json.rsplit("\"value\":").next().unwrap().trim_end_matches('}').to_string()
        };

        assert_eq!(encode(0.0), "0");
        assert_eq!(encode(1.0), "1");
        assert_eq!(encode(100.0), "100");
        assert_eq!(encode(0.5), "0.5");
        assert_eq!(encode(1.5), "1.5");
        assert_eq!(encode(0.1), "0.1");
    }

    #[test]
    fn test_integral_amount_deserializes() {
        let json = r#"{"senderBlockchainAddress":"A","recipientBlockchainAddress":"B","value":5}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx, Transaction::new("A", "B", 5.0));
        assert_eq!(tx.canonical_bytes(), json.as_bytes());
    }

    #[test]
    fn test_digest_deterministic() {
        let tx1 = Transaction::new("A", "B", 1.5);
        let tx2 = Transaction::new("A", "B", 1.5);
        assert_eq!(tx1.digest(), tx2.digest());

        let tx3 = Transaction::new("A", "B", 1.25);
        assert_ne!(tx1.digest(), tx3.digest());
    }

    #[test]
    fn test_reward_transaction() {
        let tx = Transaction::reward("miner", 1.0);
        assert!(tx.is_reward());
        assert_eq!(tx.sender(), SYSTEM_REWARD_SENDER);
        assert_eq!(tx.recipient(), "miner");
        assert!(!Transaction::new("A", "B", 1.0).is_reward());
    }

    #[test]
    fn test_negative_value_is_accepted_at_construction() {
        let tx = Transaction::new("A", "B", -3.0);
        assert_eq!(tx.value(), -3.0);
    }
}
