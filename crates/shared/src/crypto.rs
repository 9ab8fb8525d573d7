//! Hashing helpers for admin credential verification.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares a presented secret against a stored SHA-256 hex digest.
///
/// Both sides are hashed before comparison so the comparison operates on
/// fixed-length digests rather than the secret itself.
pub fn verify_secret(presented: &str, stored_hash_hex: &str) -> bool {
    let presented_hash = sha256_hex(presented);
    // Fixed-length comparison over digests; avoids early-exit on the secret.
    if presented_hash.len() != stored_hash_hex.len() {
        return false;
    }
    presented_hash
        .bytes()
        .zip(stored_hash_hex.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
        assert_ne!(sha256_hex("input1"), sha256_hex("input2"));
    }

    #[test]
    fn test_verify_secret_matches() {
        let stored = sha256_hex("admin-key-123");
        assert!(verify_secret("admin-key-123", &stored));
    }

    #[test]
    fn test_verify_secret_rejects_wrong_key() {
        let stored = sha256_hex("admin-key-123");
        assert!(!verify_secret("admin-key-124", &stored));
        assert!(!verify_secret("", &stored));
    }

    #[test]
    fn test_verify_secret_rejects_malformed_hash() {
        assert!(!verify_secret("anything", "not-a-hash"));
    }
}
