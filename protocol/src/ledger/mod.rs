//! # Ledger Access
//!
//! Everything the microloan system reads from or writes to the chain goes
//! through the [`Ledger`] trait: coin listings, balances, owned objects,
//! single objects, gas price, epoch and transaction execution.
//!
//! Two implementations:
//!
//! - [`SuiRpcClient`] speaks the fullnode JSON-RPC over `reqwest`.
//! - [`InMemoryLedger`] keeps a small world in memory for tests and demos.

pub mod memory;
pub mod rpc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transaction::SignedTransaction;
use crate::types::{Coin, LedgerObject, ObjectId, SuiAddress};

pub use memory::InMemoryLedger;
pub use rpc::SuiRpcClient;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// ---------------------------------------------------------------------------
// Execution results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failure { error: String },
}

/// What the ledger reports after executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub digest: String,
    pub status: ExecutionStatus,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

// ---------------------------------------------------------------------------
// Ledger trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Ledger: Send + Sync {
    /// All coins of `coin_type` owned by `owner`.
    async fn coins(&self, owner: SuiAddress, coin_type: &str) -> LedgerResult<Vec<Coin>>;

    /// Total balance of `coin_type` owned by `owner`, in the coin's smallest
    /// unit.
    async fn balance(&self, owner: SuiAddress, coin_type: &str) -> LedgerResult<u128>;

    /// Objects of exactly `struct_type` owned by `owner`. First page only.
    async fn owned_objects(
        &self,
        owner: SuiAddress,
        struct_type: &str,
    ) -> LedgerResult<Vec<LedgerObject>>;

    /// A single object with content and owner, or `None` if it does not
    /// exist.
    async fn object(&self, id: ObjectId) -> LedgerResult<Option<LedgerObject>>;

    async fn reference_gas_price(&self) -> LedgerResult<u64>;

    async fn latest_epoch(&self) -> LedgerResult<u64>;

    /// Submits a signed transaction and waits for local execution.
    async fn execute(&self, tx: &SignedTransaction) -> LedgerResult<ExecutionOutcome>;
}
