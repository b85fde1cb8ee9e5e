//! # Cryptographic Primitives
//!
//! Everything security-related the microloan client does locally:
//!
//! - **Ed25519** ephemeral keys that sign transactions for a zkLogin session.
//! - **Blake2b-256** for intent digests, transaction digests and addresses.
//! - **Poseidon over BN254** (circom parameters) for the zkLogin nonce and
//!   address seed.
//!
//! Each of these is a thin, typed wrapper over an audited implementation.
//! Nothing here is novel, and it should stay that way.

pub mod hash;
pub mod keys;
pub mod poseidon;

pub use hash::blake2b256;
pub use keys::{EphemeralKeypair, KeyError, SignatureScheme};
pub use poseidon::{poseidon_hash, PoseidonError};
