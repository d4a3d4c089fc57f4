// Hashing utilities

use sha2::{Sha256, Digest};
use crate::core::Hash256;

/// Single SHA256 hash
pub fn sha256(data: &[u8]) -> Hash256 {
    Hash256::new(Sha256::digest(data).into())
}

/// SHA256 double hash
/// hash256 = SHA256(SHA256(data))
pub fn hash256(data: &[u8]) -> Hash256 {
    let first_hash = Sha256::digest(data);
    Hash256::new(Sha256::digest(first_hash).into())
}

/// RIPEMD160(SHA256(data)) - used for address generation
pub fn hash160(data: &[u8]) -> [u8; 20] {
    use ripemd::{Ripemd160, Digest as RipemdDigest};
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash256_is_two_passes() {
        let data = b"hello world";
        let once = sha256(data);
        assert_eq!(hash256(data), sha256(once.as_bytes()));
        assert_ne!(hash256(data), once);
    }

    #[test]
    fn test_hash160() {
        // RIPEMD160(SHA256("")) is a well known constant
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }
}
