//! # Token Security Helpers
//!
//! Random token generation, constant-time comparison and log redaction.
//! Session identifiers and forgery tokens both come from here.

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Number of characters kept by [`redact`].
const REDACTED_PREFIX_LEN: usize = 8;

/// Generate `bytes` bytes of OS entropy, hex encoded (2 * `bytes` chars).
pub fn generate_token_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Constant-time string comparison.
///
/// Runs in time independent of how many leading bytes match. A length
/// difference still yields `false` without an early return.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let max_len = std::cmp::max(a.len(), b.len());

    // Different pad bytes guarantee a mismatch when lengths differ.
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}

/// Short prefix of a secret, safe to put in logs.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(REDACTED_PREFIX_LEN).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_uniqueness() {
        let a = generate_token_hex(32);
        let b = generate_token_hex(32);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret", "secret"));
        assert!(!constant_time_compare("secret", "Secret"));
        assert!(!constant_time_compare("secret", "secre"));
        assert!(!constant_time_compare("secret", "secrets"));
        assert!(!constant_time_compare("", "x"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_redact_keeps_prefix_only() {
        let token = "0123456789abcdef";
        assert_eq!(redact(token), "01234567...");
        assert_eq!(redact("abc"), "abc...");
    }
}
