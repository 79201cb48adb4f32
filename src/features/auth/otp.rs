//! One-time codes.
//!
//! Codes are six random digits. Only their SHA-256 digest is stored, and
//! lookups compare digests in constant time.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const OTP_LENGTH: usize = 6;

pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

pub fn code_matches(code: &str, stored_hash: &str) -> bool {
    hash_code(code).as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

/// Six ASCII digits, nothing else
pub fn is_well_formed(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(is_well_formed(&code), "bad code {}", code);
        }
    }

    #[test]
    fn test_code_matches_only_its_hash() {
        let stored = hash_code("123456");

        assert_eq!(stored.len(), 64);
        assert!(code_matches("123456", &stored));
        assert!(code_matches(" 123456 ", &stored));
        assert!(!code_matches("123457", &stored));
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("000000"));
        assert!(!is_well_formed("12345"));
        assert!(!is_well_formed("12a456"));
        assert!(!is_well_formed("1234567"));
    }
}
