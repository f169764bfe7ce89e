//! One-way PIN digest primitives.
//!
//! PINs are never stored in cleartext — only a SHA-256 digest, lowercase hex.
//! The digest is deliberately deterministic and unsalted: there is a single
//! local operator, the stored record never leaves the machine, and verify is
//! a straight recompute-and-compare. Known hardening gap (no salt, no attempt
//! throttling) kept as-is.

use sha2::{Digest, Sha256};

/// Hash a PIN to its stored form: 64 lowercase hex chars.
pub fn hash_pin(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}

/// Check a candidate PIN against a stored hash.
pub fn pin_matches(pin: &str, stored_hash: &str) -> bool {
    hash_pin(pin) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_pin("1234"), hash_pin("1234"));
        assert_eq!(hash_pin(""), hash_pin(""));
    }

    #[test]
    fn hash_is_fixed_width_hex() {
        let h = hash_pin("1234");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn distinct_pins_hash_distinctly() {
        // Small corpus; any collision here would be a catastrophic bug.
        let corpus = ["0000", "1234", "12345", "9999", "1111", "abcd", "123"];
        for (i, a) in corpus.iter().enumerate() {
            for b in corpus.iter().skip(i + 1) {
                assert_ne!(hash_pin(a), hash_pin(b), "{a} and {b} collided");
            }
        }
    }

    #[test]
    fn matches_only_the_hashed_pin() {
        let h = hash_pin("1234");
        assert!(pin_matches("1234", &h));
        assert!(!pin_matches("0000", &h));
        assert!(!pin_matches("12345", &h));
        assert!(!pin_matches("", &h));
    }
}
