//! Nonce binding the OAuth request to an ephemeral key.
//!
//! `nonce = base64url(last 20 bytes of Poseidon(pk_hi, pk_lo, max_epoch,
//! randomness))`, where `pk_hi`/`pk_lo` split the 33-byte scheme-tagged
//! public key at 128 bits. The provider echoes the nonce inside the JWT, and
//! the proof shows the JWT commits to this exact key and expiry.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use num_bigint::BigUint;
use rand::RngCore;

use super::ZkLoginResult;
use crate::config::NONCE_LENGTH;
use crate::crypto::keys::EphemeralKeypair;
use crate::crypto::poseidon::{fr_from_decimal, fr_to_be_bytes, poseidon_hash};

/// 128 bits of fresh randomness, as a decimal string.
pub fn generate_randomness() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    u128::from_be_bytes(bytes).to_string()
}

/// Computes the OAuth nonce for `keypair`, valid through `max_epoch`.
pub fn generate_nonce(
    keypair: &EphemeralKeypair,
    max_epoch: u64,
    randomness: &str,
) -> ZkLoginResult<String> {
    let pk = keypair.scheme_public_key();
    // 33 bytes: the top 17 are the high half, the bottom 16 the low half.
    let (hi, lo) = pk.split_at(pk.len() - 16);

    let digest = poseidon_hash(&[
        Fr::from_be_bytes_mod_order(hi),
        Fr::from_be_bytes_mod_order(lo),
        Fr::from(max_epoch),
        fr_from_decimal(randomness)?,
    ])?;

    let bytes = fr_to_be_bytes(&digest);
    Ok(URL_SAFE_NO_PAD.encode(&bytes[bytes.len() - NONCE_LENGTH..]))
}

/// The scheme-tagged ephemeral public key as a decimal integer, the form
/// the prover expects.
pub fn extended_ephemeral_public_key(keypair: &EphemeralKeypair) -> String {
    BigUint::from_bytes_be(&keypair.scheme_public_key()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn randomness_is_decimal_and_fresh() {
        let a = generate_randomness();
        let b = generate_randomness();
        assert!(a.chars().all(|c| c.is_ascii_digit()));
        assert_ne!(a, b);
    }

    #[test]
    fn nonce_has_fixed_length() {
        let kp = EphemeralKeypair::from_seed(&[1u8; 32]);
        let nonce = generate_nonce(&kp, 10, "12345").unwrap();
        assert_eq!(nonce.len(), 27);
        assert!(!nonce.contains('='));
    }

    #[test]
    fn nonce_binds_key_epoch_and_randomness() {
        let kp = EphemeralKeypair::from_seed(&[1u8; 32]);
        let other = EphemeralKeypair::from_seed(&[2u8; 32]);
        let base = generate_nonce(&kp, 10, "12345").unwrap();

        assert_eq!(base, generate_nonce(&kp, 10, "12345").unwrap());
        assert_ne!(base, generate_nonce(&other, 10, "12345").unwrap());
        assert_ne!(base, generate_nonce(&kp, 11, "12345").unwrap());
        assert_ne!(base, generate_nonce(&kp, 10, "12346").unwrap());
    }

    #[test]
    fn nonce_rejects_bad_randomness() {
        let kp = EphemeralKeypair::from_seed(&[1u8; 32]);
        assert!(generate_nonce(&kp, 10, "not-a-number").is_err());
    }

    #[test]
    fn extended_key_is_decimal_of_flagged_key() {
        let kp = EphemeralKeypair::from_seed(&[5u8; 32]);
        let decimal = extended_ephemeral_public_key(&kp);
        let parsed = BigUint::parse_bytes(decimal.as_bytes(), 10).unwrap();
        let mut expected = vec![0u8];
        expected.extend_from_slice(&kp.public_key_bytes());
        assert_eq!(parsed, BigUint::from_bytes_be(&expected));
    }
}
