//! # Poseidon over BN254
//!
//! zkLogin commits to its public inputs with the circom-parameterized
//! Poseidon hash over the BN254 scalar field. `light-poseidon` provides
//! exactly those parameters for up to 12 inputs; we never need more than 4.
//!
//! Field elements cross module boundaries as decimal strings, which is how
//! the prover, the salt service and the signature format all spell them.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;
use thiserror::Error;

use crate::config::PACK_WIDTH;

/// Errors from field conversion and hashing.
#[derive(Debug, Error)]
pub enum PoseidonError {
    #[error("poseidon hash failed: {0}")]
    Hash(#[from] light_poseidon::PoseidonError),

    #[error("not a decimal integer: {0}")]
    InvalidDecimal(String),

    #[error("value does not fit the BN254 scalar field: {0}")]
    OutOfField(String),

    #[error("string of {len} bytes exceeds the {max}-byte limit")]
    StringTooLong { len: usize, max: usize },

    #[error("poseidon needs between 1 and 12 inputs, got {0}")]
    InputCount(usize),
}

/// Hash of `inputs` with circom Poseidon parameters.
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr, PoseidonError> {
    if inputs.is_empty() || inputs.len() > 12 {
        return Err(PoseidonError::InputCount(inputs.len()));
    }
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())?;
    Ok(hasher.hash(inputs)?)
}

/// Parses a decimal string into a field element. Values at or above the
/// field modulus are rejected rather than reduced.
pub fn fr_from_decimal(s: &str) -> Result<Fr, PoseidonError> {
    let n = BigUint::parse_bytes(s.trim().as_bytes(), 10)
        .ok_or_else(|| PoseidonError::InvalidDecimal(s.to_string()))?;
    let modulus = BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be());
    if n >= modulus {
        return Err(PoseidonError::OutOfField(s.to_string()));
    }
    Ok(Fr::from_be_bytes_mod_order(&n.to_bytes_be()))
}

/// Canonical decimal rendering of a field element ("0" for zero).
pub fn fr_to_decimal(value: &Fr) -> String {
    BigUint::from_bytes_be(&value.into_bigint().to_bytes_be()).to_string()
}

/// Big-endian bytes of a field element, left-padded to 32.
pub fn fr_to_be_bytes(value: &Fr) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Hashes an ASCII string into one field element.
///
/// The string is right-padded with zero bytes to `max_len`, split into
/// 31-byte big-endian limbs counted from the right (so only the leading
/// limb can be short), and the limbs are Poseidon-hashed.
pub fn hash_ascii_str_to_field(s: &str, max_len: usize) -> Result<Fr, PoseidonError> {
    let bytes = s.as_bytes();
    if bytes.len() > max_len {
        return Err(PoseidonError::StringTooLong {
            len: bytes.len(),
            max: max_len,
        });
    }
    let mut padded = bytes.to_vec();
    padded.resize(max_len, 0);

    let limb_bytes = PACK_WIDTH / 8;
    let mut limbs: Vec<Fr> = padded
        .rchunks(limb_bytes)
        .map(Fr::from_be_bytes_mod_order)
        .collect();
    limbs.reverse();
    poseidon_hash(&limbs)
}
