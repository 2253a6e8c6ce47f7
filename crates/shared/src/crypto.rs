//! Cryptographic utilities for admin key checks and ticket code generation.

use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

/// Uppercase alphanumeric alphabet used for ticket suffixes.
pub const UPPER_ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares a presented secret against the expected one in constant time.
///
/// Both sides are hashed first so the comparison always runs over equal-length
/// digests.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    constant_time_eq(&presented, &expected)
}

/// Generates a random string of `len` characters drawn uniformly from `alphabet`.
///
/// Uses the operating system CSPRNG; `gen_range` samples without modulo bias.
pub fn random_code(len: usize, alphabet: &[u8]) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

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
    fn test_secrets_match() {
        assert!(secrets_match("admin-key", "admin-key"));
        assert!(!secrets_match("admin-key", "admin-kez"));
        assert!(!secrets_match("", "admin-key"));
        assert!(!secrets_match("admin-key-but-longer", "admin-key"));
    }

    #[test]
    fn test_random_code_length_and_alphabet() {
        let code = random_code(6, UPPER_ALPHANUMERIC);
        assert_eq!(code.len(), 6);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_random_code_empty() {
        assert_eq!(random_code(0, UPPER_ALPHANUMERIC), "");
    }

    #[test]
    fn test_random_code_uniqueness() {
        let codes: HashSet<String> = (0..200)
            .map(|_| random_code(6, UPPER_ALPHANUMERIC))
            .collect();
        // 36^6 possibilities; collisions in 200 draws are vanishingly rare
        assert!(codes.len() >= 199);
    }

    #[test]
    fn test_random_code_covers_alphabet() {
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(random_code(6, UPPER_ALPHANUMERIC).chars());
        }
        assert!(seen.len() > 30);
    }
}
