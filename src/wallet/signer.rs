// ECDSA signing and verification of transactions

use crate::core::{sha256, Transaction};
use crate::wallet::{KeyError, KeyPair};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Detached signature: R and S as two 32-byte big-endian integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSignature(Signature);

impl TransactionSignature {
    /// 128 hex characters, R then S
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.serialize_compact())
    }

    /// Parse the R‖S hex form
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        if bytes.len() != 64 {
            return Err(KeyError::InvalidSignature(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }
        Signature::from_compact(&bytes)
            .map(Self)
            .map_err(|e| KeyError::InvalidSignature(e.to_string()))
    }
}

impl std::fmt::Display for TransactionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Sign SHA256(message)
pub fn sign(secret_key: &SecretKey, message: &[u8]) -> TransactionSignature {
    let secp = Secp256k1::signing_only();
    let digest = Message::from_digest(*sha256(message).as_bytes());
    TransactionSignature(secp.sign_ecdsa(&digest, secret_key))
}

/// Verify a signature over SHA256(message)
pub fn verify(public_key: &PublicKey, signature: &TransactionSignature, message: &[u8]) -> bool {
    let secp = Secp256k1::verification_only();
    let digest = Message::from_digest(*sha256(message).as_bytes());

    // libsecp256k1 only accepts low-S; signers outside this crate may not normalize
    let mut signature = signature.0;
    signature.normalize_s();

    secp.verify_ecdsa(&digest, &signature, public_key).is_ok()
}

/// A transfer signed by its sender, ready for submission
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    pub transaction: Transaction,
    pub sender_public_key: PublicKey,
    pub signature: TransactionSignature,
}

/// Build a transfer from the key pair's own address and sign it
pub fn sign_transaction(key_pair: &KeyPair, recipient: &str, value: f32) -> SignedTransfer {
    let transaction = Transaction::new(key_pair.address.as_str(), recipient, value);
    let signature = sign(&key_pair.secret_key, &transaction.canonical_bytes());

    SignedTransfer {
        transaction,
        sender_public_key: key_pair.public_key,
        signature,
    }
}
