//! # Transaction Module
//!
//! Construction, coin selection and signing of chain transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs          — BCS model of TransactionData (inputs, commands, gas)
//! builder.rs        — ProgrammableTransactionBuilder + fluent TransactionBuilder
//! coin_selection.rs — smallest-sufficient payment coin
//! signing.rs        — Ed25519 and zkLogin signatures over the intent digest
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Select** a payment coin with [`select_coin`].
//! 2. **Build** the programmable transaction and wrap it with
//!    [`TransactionBuilder`]. The server stops here and returns base64 bytes.
//! 3. **Sign** with [`sign_zklogin_transaction`] after rebinding the sender.
//! 4. **Execute** through a [`crate::ledger::Ledger`].
//!
//! All amounts are `u64` MIST. No floating point anywhere near money.

pub mod builder;
pub mod coin_selection;
pub mod signing;
pub mod types;

use thiserror::Error;

use crate::zklogin::ZkLoginError;

pub use builder::{ProgrammableTransactionBuilder, TransactionBuilder};
pub use coin_selection::{required_balance, select_coin};
pub use signing::{sign_transaction, sign_user, sign_zklogin_transaction, SignedTransaction};
pub use types::{Argument, CallArg, Command, ObjectArg, TransactionData};

/// Errors raised while building, encoding or signing a transaction.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No coin with balance >= {amount} MIST")]
    NoSuitableCoin { amount: u64 },

    #[error("transaction is missing {0}")]
    MissingField(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transaction encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Signature(#[from] ZkLoginError),
}

pub type BuildResult<T> = Result<T, BuildError>;
