//! Salted password digests for user accounts
//!
//! Stored form is `{salt_hex}${digest_hex}` where the digest is
//! SHA-256 over salt followed by the password bytes.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Hash a password with a fresh random 16-byte salt
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let salt_hex: String = salt.iter().map(|b| format!("{:02x}", b)).collect();
    let digest = digest_with_salt(&salt_hex, password);
    format!("{}${}", salt_hex, digest)
}

/// Verify a password against a stored `{salt_hex}${digest_hex}` value
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt_hex, expected)) => digest_with_salt(salt_hex, password) == expected,
        None => false,
    }
}

fn digest_with_salt(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let a = hash_password("same password");
        let b = hash_password("same password");
        assert_ne!(a, b);
        assert!(verify_password("same password", &a));
        assert!(verify_password("same password", &b));
    }

    #[test]
    fn test_malformed_stored_value_rejected() {
        assert!(!verify_password("anything", "no-separator-here"));
    }
}
