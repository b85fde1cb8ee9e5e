// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Microloan Protocol — Core Library
//!
//! Everything the microloan backend and wallet share: the chain vocabulary,
//! the transaction model, the ledger client and the zkLogin math. The chain
//! does the hard parts (consensus, execution, proof verification). This crate
//! makes sure what we hand it is byte-exact.
//!
//! ## Architecture
//!
//! - **types** — Addresses, object ids, digests, references, owners, coins.
//! - **crypto** — Blake2b-256, Ed25519 ephemeral keys, Poseidon over BN254.
//! - **zklogin** — Nonce, address seed, address and the composite signature.
//! - **transaction** — BCS `TransactionData`, builders, coin selection, signing.
//! - **ledger** — The `Ledger` trait, a JSON-RPC client and an in-memory ledger.
//! - **loan** — Typed snapshots of loan requests and reputation objects.
//! - **service** — Building microloan transactions and answering queries.
//! - **config** — Package coordinates, networks, limits and amount helpers.
//!
//! ## Design Philosophy
//!
//! 1. Money is `u64` MIST. Decimal SUI exists only at the CLI boundary.
//! 2. Every byte that gets signed comes out of `bcs`, never a hand-rolled
//!    encoder.
//! 3. Anything that talks to the network sits behind a trait so tests do not.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod ledger;
pub mod loan;
pub mod service;
pub mod transaction;
pub mod types;
pub mod zklogin;
