//! Stable 64-bit hashing of identifiers
//!
//! Uses SHA-256 so the same id always maps to the same value across runs and
//! platforms. Probabilistic estimators depend on the output bits being
//! uniformly distributed.

use sha2::{Digest, Sha256};

/// Hash an identifier to a 64-bit value
///
/// The first 8 bytes of the SHA-256 digest, big-endian.
pub fn hash_key(key: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let hash = hasher.finalize();

    u64::from_be_bytes([
        hash[0], hash[1], hash[2], hash[3], hash[4], hash[5], hash[6], hash[7],
    ])
}

/// Index formed by the top `bits` bits of a hash
pub fn top_bits(hash: u64, bits: u8) -> usize {
    assert!(bits > 0 && bits < 64, "bits must be in 1..64");
    (hash >> (64 - bits as u32)) as usize
}
