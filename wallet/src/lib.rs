// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Microloan Wallet
//!
//! The client half of the microloan system: logs a user in through an
//! OAuth provider with zkLogin, keeps the resulting session on disk, asks the
//! backend for unsigned transactions, signs them with the session's
//! ephemeral key, and submits them to the ledger.
//!
//! ## Modules
//!
//! | Module          | Purpose                                                    |
//! |-----------------|------------------------------------------------------------|
//! | `config`        | `wallet.json` client settings (client ids, service URLs)   |
//! | `session`       | Versioned sled store for the pending login and accounts    |
//! | `identity`      | OAuth redirect flow, salt and proof fetch, address          |
//! | `zk_services`   | HTTP clients for the salt and prover services              |
//! | `backend`       | HTTP client for the transaction builder / query API        |
//! | `faucet`        | Test-network faucet client for unfunded accounts           |
//! | `signer`        | zkLogin signing and submission                             |
//! | `balances`      | Concurrent balance refresh for every account               |
//! | `logging`       | `tracing` subscriber setup                                 |
//!
//! ## Login
//!
//! ```text
//!  unauthenticated ──start_login──► pending-redirect ──complete_login──► authenticated
//!                                   (Setup stored)                       (Account stored,
//!                                                                         Setup consumed)
//! ```

pub mod backend;
pub mod balances;
pub mod config;
pub mod error;
pub mod faucet;
pub mod identity;
pub mod logging;
pub mod session;
pub mod signer;
pub mod zk_services;

pub use error::{WalletError, WalletResult};
