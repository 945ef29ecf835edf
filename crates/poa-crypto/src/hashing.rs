//! Keccak-256 hashing.

use sha3::{Digest, Keccak256};

/// Keccak-256 hash output (256-bit).
pub type Hash256 = [u8; 32];

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash256 {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Keccak256::digest(data));
    output
}

/// Keccak-256 over multiple contiguous segments, without an intermediate
/// allocation.
pub fn keccak256_concat(segments: &[&[u8]]) -> Hash256 {
    let mut hasher = Keccak256::new();
    for segment in segments {
        hasher.update(segment);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}
