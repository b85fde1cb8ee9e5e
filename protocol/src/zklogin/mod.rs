//! # zkLogin
//!
//! The local half of zkLogin: everything the client computes itself before
//! and after talking to the OAuth provider, the salt service and the prover.
//!
//! ```text
//! ephemeral key + max epoch + randomness ──► nonce ──► OAuth id_token (JWT)
//! JWT + salt ──► address seed ──► address
//! proof + address seed + max epoch + user signature ──► zkLogin signature
//! ```
//!
//! Proof generation stays external.

pub mod address;
pub mod jwt;
pub mod nonce;
pub mod signature;

use thiserror::Error;

use crate::crypto::PoseidonError;

pub use address::{address_from_seed, gen_address_seed, jwt_to_address};
pub use jwt::{decode_claims, JwtClaims};
pub use nonce::{extended_ephemeral_public_key, generate_nonce, generate_randomness};
pub use signature::{ZkLoginInputs, ZkLoginProof, ZkLoginSignature};

/// Errors from zkLogin derivations.
#[derive(Debug, Error)]
pub enum ZkLoginError {
    #[error(transparent)]
    Field(#[from] PoseidonError),

    #[error("malformed JWT: {0}")]
    MalformedJwt(String),

    #[error("issuer {0} is longer than 255 bytes")]
    IssuerTooLong(String),

    #[error("signature encoding failed: {0}")]
    Encoding(String),
}

pub type ZkLoginResult<T> = Result<T, ZkLoginError>;
