//! # Hashing Utilities
//!
//! The chain hashes with Blake2b truncated to 256 bits: intent messages
//! before signing, transaction data for digests, and signature-scheme
//! tagged public inputs for addresses. One function covers all three.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Compute the Blake2b-256 hash of the input data.
///
/// # Example
///
/// ```
/// use microloan_protocol::crypto::blake2b256;
///
/// let hash = blake2b256(b"microloan");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Blake2b-256 over several slices, without concatenating them first.
pub fn blake2b256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b256_known_vector() {
        // Blake2b-256("") from the reference implementation.
        assert_eq!(
            hex::encode(blake2b256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn parts_match_concatenation() {
        let joined = blake2b256(b"TransactionData::payload");
        let parts = blake2b256_parts(&[&b"TransactionData::"[..], &b"payload"[..]]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(blake2b256(b"a"), blake2b256(b"b"));
    }
}
