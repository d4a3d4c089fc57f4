// Key pairs and address derivation

use crate::core::{hash160, hash256};
use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version byte prepended to the public key hash
pub const ADDRESS_VERSION: u8 = 0x00;
/// version (1) + hash160 (20) + checksum (4)
pub const ADDRESS_PAYLOAD_LEN: usize = 25;
const CHECKSUM_LEN: usize = 4;

/// Key, signature and address decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Base58Check address string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Derive the address of a public key.
    ///
    /// SHA256 then RIPEMD160 over the raw X‖Y coordinates, version byte in
    /// front, first four bytes of a double SHA256 appended, Base58 encoded.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let pubkey_hash = hash160(&public_key_coordinates(public_key));

        let mut payload = Vec::with_capacity(ADDRESS_PAYLOAD_LEN);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&pubkey_hash);

        let checksum = hash256(&payload);
        payload.extend_from_slice(&checksum.as_bytes()[..CHECKSUM_LEN]);

        Self(bs58::encode(payload).into_string())
    }

    /// Decode and check version byte, length and checksum
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| KeyError::InvalidAddress(e.to_string()))?;

        if bytes.len() != ADDRESS_PAYLOAD_LEN {
            return Err(KeyError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_PAYLOAD_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != ADDRESS_VERSION {
            return Err(KeyError::InvalidAddress(format!("unknown version byte {:#04x}", bytes[0])));
        }

        let (payload, checksum) = bytes.split_at(ADDRESS_PAYLOAD_LEN - CHECKSUM_LEN);
        if &hash256(payload).as_bytes()[..CHECKSUM_LEN] != checksum {
            return Err(KeyError::InvalidAddress("checksum mismatch".to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// Get address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// RIPEMD160 digest carried by the address
    pub fn pubkey_hash(&self) -> Result<[u8; 20], KeyError> {
        Self::parse(&self.0)?;
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| KeyError::InvalidAddress(e.to_string()))?;

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes[1..21]);
        Ok(hash)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// X‖Y as two 32-byte big-endian integers
pub fn public_key_coordinates(public_key: &PublicKey) -> [u8; 64] {
    let uncompressed = public_key.serialize_uncompressed();
    let mut coordinates = [0u8; 64];
    coordinates.copy_from_slice(&uncompressed[1..]);
    coordinates
}

/// 128 hex characters, X then Y
pub fn public_key_to_hex(public_key: &PublicKey) -> String {
    hex::encode(public_key_coordinates(public_key))
}

/// Parse the X‖Y hex form produced by [`public_key_to_hex`]
pub fn public_key_from_hex(s: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
    if bytes.len() != 64 {
        return Err(KeyError::InvalidPublicKey(format!(
            "expected 64 coordinate bytes, got {}",
            bytes.len()
        )));
    }

    let mut uncompressed = [0u8; 65];
    uncompressed[0] = 0x04;
    uncompressed[1..].copy_from_slice(&bytes);

    PublicKey::from_slice(&uncompressed).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
}

/// Key pair with its derived address
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl KeyPair {
    /// Generate a new key pair
    pub fn generate() -> Self {
        let mut rng = OsRng;
        Self::from_secret_key(SecretKey::new(&mut rng))
    }

    fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = secret_key.public_key(&secp);
        let address = Address::from_public_key(&public_key);

        Self {
            secret_key,
            public_key,
            address,
        }
    }

    /// Restore from the hex private key printed by [`KeyPair::private_key_hex`]
    pub fn from_private_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    pub fn public_key_hex(&self) -> String {
        public_key_to_hex(&self.public_key)
    }

    /// Export including the private key; only on explicit request
    pub fn export(&self) -> WalletExport {
        WalletExport {
            private_key: self.private_key_hex(),
            public_key: self.public_key_hex(),
            blockchain_address: self.address.0.clone(),
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// JSON shape handed to wallet clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletExport {
    pub private_key: String,
    pub public_key: String,
    pub blockchain_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sha256;

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate();

        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 128);
        assert!(Address::parse(kp.address.as_str()).is_ok());
    }

    #[test]
    fn test_address_is_deterministic() {
        let kp = KeyPair::generate();
        let restored = KeyPair::from_private_hex(&kp.private_key_hex()).unwrap();

        assert_eq!(restored.address, kp.address);
        assert_eq!(Address::from_public_key(&kp.public_key), kp.address);
    }

    #[test]
    fn test_address_pipeline_by_hand() {
        let kp = KeyPair::generate();
        let coordinates = public_key_coordinates(&kp.public_key);

        let step2 = sha256(&coordinates);
        let step3: [u8; 20] = {
            use ripemd::{Digest, Ripemd160};
            Ripemd160::digest(step2.as_bytes()).into()
        };
        let mut step4 = vec![0x00];
        step4.extend_from_slice(&step3);
        let first = sha256(&step4);
        let second = sha256(first.as_bytes());
        let mut step6 = step4.clone();
        step6.extend_from_slice(&second.as_bytes()[..4]);

        assert_eq!(step6.len(), 25);
        assert_eq!(bs58::encode(&step6).into_string(), kp.address.0);
    }

    #[test]
    fn test_decoded_address_layout() {
        let kp = KeyPair::generate();
        let bytes = bs58::decode(kp.address.as_str()).into_vec().unwrap();

        assert_eq!(bytes.len(), ADDRESS_PAYLOAD_LEN);
        assert_eq!(bytes[0], ADDRESS_VERSION);
        assert_eq!(
            kp.address.pubkey_hash().unwrap(),
            hash160(&public_key_coordinates(&kp.public_key))
        );
    }

    #[test]
    fn test_tampered_checksum_rejected() {
        let kp = KeyPair::generate();
        let mut bytes = bs58::decode(kp.address.as_str()).into_vec().unwrap();
        bytes[24] ^= 0x01;
        let tampered = bs58::encode(bytes).into_string();

        assert!(matches!(
            Address::parse(&tampered),
            Err(KeyError::InvalidAddress(_))
        ));
        assert!(Address::parse("not-base58-0OIl").is_err());
    }

    #[test]
    fn test_known_key_vector() {
        // Private key 1: the public key is the secp256k1 generator point
        let kp = KeyPair::from_private_hex(&format!("{:064x}", 1)).unwrap();

        assert_eq!(
            kp.public_key_hex(),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
        assert_eq!(kp.address.as_str(), "1KGYN13Exrsyx7CnsEGMVbD8oUwHta2ZsG");
    }

    #[test]
    fn test_p256_public_key_rejected() {
        // The P-256 generator point is not on secp256k1
        let p256_generator = "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296\
                              4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5";
        assert!(matches!(
            public_key_from_hex(p256_generator),
            Err(KeyError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_distinct_keypairs_distinct_addresses() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_public_key_hex_round_trip() {
        let kp = KeyPair::generate();
        let parsed = public_key_from_hex(&kp.public_key_hex()).unwrap();
        assert_eq!(parsed, kp.public_key);

        assert!(matches!(public_key_from_hex("zz"), Err(KeyError::InvalidHex(_))));
        assert!(matches!(
            public_key_from_hex(&"00".repeat(64)),
            Err(KeyError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_export_shape() {
        let kp = KeyPair::generate();
        let value = serde_json::to_value(kp.export()).unwrap();

        assert_eq!(value["privateKey"], kp.private_key_hex());
        assert_eq!(value["publicKey"], kp.public_key_hex());
        assert_eq!(value["blockchainAddress"], kp.address.as_str());
    }
}
