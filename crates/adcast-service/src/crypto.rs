//! Cryptographic utilities for key verification.

use sha2::{Digest, Sha256};

/// Compute SHA-256 and return the hex-encoded digest (64 characters).
#[must_use]
pub fn sha256_hex(message: &str) -> String {
    hex::encode(Sha256::digest(message.as_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
///
/// Returns `true` if the strings are equal, `false` otherwise.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Whether `presented` matches a configured key.
///
/// The plain key is compared directly; the SHA-256 form is compared against the hex
/// digest of `presented` (case-insensitive hex). Both comparisons run in constant time.
#[must_use]
pub fn key_matches(presented: &str, plain: Option<&str>, sha256: Option<&str>) -> bool {
    let plain_ok = plain.is_some_and(|key| constant_time_eq(presented, key));
    let hash_ok = sha256.is_some_and(|digest| {
        constant_time_eq(&sha256_hex(presented), &digest.trim().to_lowercase())
    });
    plain_ok || hash_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_produces_known_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn constant_time_eq_equal_strings() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn constant_time_eq_different_strings() {
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "ABC"));
    }

    #[test]
    fn key_matches_plain_or_hash() {
        let digest = sha256_hex("operator-secret").to_uppercase();
        assert!(key_matches("operator-secret", Some("operator-secret"), None));
        assert!(key_matches("operator-secret", None, Some(&digest)));
        assert!(!key_matches("wrong", Some("operator-secret"), Some(&digest)));
        assert!(!key_matches("operator-secret", None, None));
    }
}
