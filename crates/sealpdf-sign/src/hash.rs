//! Content hashing and hex-format validation.
//!
//! Hashes are keccak-256 rendered as `0x` plus 64 lowercase hex digits,
//! the format the verification contract stores. Signatures are 65-byte
//! ECDSA blobs in the same `0x` hex convention.

use sha3::{Digest, Keccak256};

/// keccak-256 of `bytes` as `0x`-prefixed lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Keccak256::digest(bytes);
    format!("0x{}", hex::encode(digest))
}

/// `0x` plus 64 hex digits.
pub fn is_valid_hash(s: &str) -> bool {
    is_hex_blob(s, 64)
}

/// `0x` plus 130 hex digits (65-byte recoverable ECDSA signature).
pub fn is_valid_signature(s: &str) -> bool {
    is_hex_blob(s, 130)
}

fn is_hex_blob(s: &str, digits: usize) -> bool {
    s.len() == 2 + digits
        && s.starts_with("0x")
        && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}
