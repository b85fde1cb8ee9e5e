//! # Ephemeral Key Management
//!
//! A zkLogin session signs with a short-lived Ed25519 keypair. The key is
//! generated at login, bound into the OAuth nonce, and must stay in the
//! session store until the session's max epoch passes.
//!
//! ## Security considerations
//!
//! - Keys come from `OsRng`.
//! - Secret key bytes are never logged. `Debug` prints the public key only.
//! - The exported form is the chain's Bech32 `suiprivkey1…` string
//!   (scheme flag + 32 secret bytes), so a key can be imported into other
//!   wallets.

use bech32::{Bech32, Hrp};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

/// Human-readable part of an exported private key.
pub const PRIVATE_KEY_HRP: &str = "suiprivkey";

/// Errors that can occur during key operations.
///
/// Deliberately vague about key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key encoding: {0}")]
    InvalidEncoding(String),

    #[error("unsupported signature scheme flag {0:#04x}")]
    UnsupportedScheme(u8),

    #[error("invalid secret key bytes: wrong length")]
    InvalidSecretKey,
}

/// Signature scheme flags, the first byte of every serialized signature and
/// of every scheme-tagged public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SignatureScheme {
    Ed25519 = 0x00,
    ZkLogin = 0x05,
}

impl SignatureScheme {
    pub fn flag(self) -> u8 {
        self as u8
    }
}

/// Ed25519 keypair used for one zkLogin session.
///
/// Intentionally not `Serialize`: persisting it goes through
/// [`to_bech32`](Self::to_bech32) so it is always a conscious act.
pub struct EphemeralKeypair {
    signing_key: SigningKey,
}

impl EphemeralKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parses a `suiprivkey1…` string.
    pub fn from_bech32(encoded: &str) -> Result<Self, KeyError> {
        let (hrp, data) =
            bech32::decode(encoded).map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
        if hrp.as_str() != PRIVATE_KEY_HRP {
            return Err(KeyError::InvalidEncoding(format!(
                "expected {PRIVATE_KEY_HRP} prefix, got {hrp}"
            )));
        }
        let (flag, secret) = data.split_first().ok_or(KeyError::InvalidSecretKey)?;
        if *flag != SignatureScheme::Ed25519.flag() {
            return Err(KeyError::UnsupportedScheme(*flag));
        }
        let secret: [u8; SECRET_KEY_LENGTH] =
            secret.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&secret))
    }

    /// Exports the secret key as `suiprivkey1…`.
    ///
    /// **Handle with care.** Whoever holds this string can sign for the
    /// session until its max epoch.
    pub fn to_bech32(&self) -> Result<String, KeyError> {
        let hrp = Hrp::parse_unchecked(PRIVATE_KEY_HRP);
        let mut data = Vec::with_capacity(1 + SECRET_KEY_LENGTH);
        data.push(SignatureScheme::Ed25519.flag());
        data.extend_from_slice(&self.signing_key.to_bytes());
        bech32::encode::<Bech32>(hrp, &data).map_err(|e| KeyError::InvalidEncoding(e.to_string()))
    }

    /// Raw 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Scheme flag followed by the public key (33 bytes). This is the form
    /// hashed into the zkLogin nonce.
    pub fn scheme_public_key(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        out[0] = SignatureScheme::Ed25519.flag();
        out[1..].copy_from_slice(&self.public_key_bytes());
        out
    }

    /// Sign a message. Ed25519 is deterministic: same key, same message,
    /// same signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Serialized user signature: `flag ‖ signature ‖ public key` (97 bytes).
    pub fn sign_serialized(&self, message: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 64 + 32);
        out.push(SignatureScheme::Ed25519.flag());
        out.extend_from_slice(&self.sign(message));
        out.extend_from_slice(&self.public_key_bytes());
        out
    }

    /// Verify a raw signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        verify_ed25519(&self.public_key_bytes(), message, signature)
    }
}

/// Verifies an Ed25519 signature over `message`.
pub fn verify_ed25519(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    key.verify(message, &Signature::from_bytes(signature)).is_ok()
}

impl Clone for EphemeralKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only.
        write!(
            f,
            "EphemeralKeypair(pub={})",
            hex::encode(self.public_key_bytes())
        )
    }
}

impl PartialEq for EphemeralKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for EphemeralKeypair {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let kp = EphemeralKeypair::generate();
        let sig = kp.sign(b"repay loan 7");
        assert!(kp.verify(b"repay loan 7", &sig));
        assert!(!kp.verify(b"repay loan 8", &sig));
    }

    #[test]
    fn bech32_round_trip() {
        let kp = EphemeralKeypair::from_seed(&[9u8; 32]);
        let encoded = kp.to_bech32().unwrap();
        assert!(encoded.starts_with("suiprivkey1"));
        let back = EphemeralKeypair::from_bech32(&encoded).unwrap();
        assert_eq!(back, kp);
    }

    #[test]
    fn bech32_rejects_foreign_prefix() {
        let hrp = Hrp::parse("bc").unwrap();
        let mut data = vec![0u8];
        data.extend_from_slice(&[1u8; 32]);
        let encoded = bech32::encode::<Bech32>(hrp, &data).unwrap();
        assert!(matches!(
            EphemeralKeypair::from_bech32(&encoded),
            Err(KeyError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn bech32_rejects_other_schemes() {
        let hrp = Hrp::parse(PRIVATE_KEY_HRP).unwrap();
        let mut data = vec![0x01u8];
        data.extend_from_slice(&[1u8; 32]);
        let encoded = bech32::encode::<Bech32>(hrp, &data).unwrap();
        assert!(matches!(
            EphemeralKeypair::from_bech32(&encoded),
            Err(KeyError::UnsupportedScheme(0x01))
        ));
    }

    #[test]
    fn serialized_signature_layout() {
        let kp = EphemeralKeypair::from_seed(&[3u8; 32]);
        let sig = kp.sign_serialized(b"msg");
        assert_eq!(sig.len(), 97);
        assert_eq!(sig[0], SignatureScheme::Ed25519.flag());
        assert_eq!(&sig[65..], &kp.public_key_bytes());

        let scheme_pk = kp.scheme_public_key();
        assert_eq!(scheme_pk[0], 0x00);
        assert_eq!(&scheme_pk[1..], &kp.public_key_bytes());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = EphemeralKeypair::from_seed(&[0xAB; 32]);
        let dbg = format!("{kp:?}");
        assert!(!dbg.contains(&hex::encode([0xABu8; 32])));
    }
}
