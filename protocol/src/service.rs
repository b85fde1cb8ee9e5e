//! # Microloan Service
//!
//! The two backend responsibilities, independent of HTTP:
//!
//! - **Build**: turn a [`MicroloanCall`] for a sender into unsigned,
//!   base64 BCS transaction bytes. The payment coin doubles as the gas coin,
//!   so it has to cover the amount plus the gas budget; payment operations
//!   split the exact amount off it and hand the new coin to the Move
//!   function as its first argument.
//! - **Query**: the sender's reputation object and loan request snapshots.
//!
//! ```text
//! call ──► select coin ──► resolve object args ──► PTB ──► TransactionData ──► base64
//! ```

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ProgramConfig, FN_BACK_LOAN, FN_CREATE_LOAN, FN_INIT_REPUTATION, FN_REPAY};
use crate::ledger::{Ledger, LedgerError};
use crate::loan::{Loan, LoanError, ReputationRecord};
use crate::transaction::types::{Argument, ObjectArg};
use crate::transaction::{
    required_balance, select_coin, BuildError, ProgrammableTransactionBuilder,
    TransactionBuilder,
};
use crate::types::{ObjectId, Owner, SuiAddress};

pub const REPUTATION_NOT_FOUND: &str = "Reputation not found";
pub const LOAN_REQUEST_NOT_FOUND: &str = "LoanRequest not found";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Required request fields that were absent, `null` or empty.
    #[error("{} required", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    InvalidParam(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Loan(#[from] LoanError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// One of the four entry functions of the microloan package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MicroloanCall {
    InitReputation,
    CreateLoan {
        amount: u64,
        interest_bps: u64,
        due_epoch: u64,
    },
    BackLoan {
        loan_request_id: ObjectId,
        amount: u64,
    },
    Repay {
        loan_request_id: ObjectId,
        repayment_amount: u64,
        reputation_id: ObjectId,
    },
}

impl MicroloanCall {
    /// Move function name.
    pub fn function(&self) -> &'static str {
        match self {
            Self::InitReputation => FN_INIT_REPUTATION,
            Self::CreateLoan { .. } => FN_CREATE_LOAN,
            Self::BackLoan { .. } => FN_BACK_LOAN,
            Self::Repay { .. } => FN_REPAY,
        }
    }

    /// The amount split off the gas coin and passed to the call, if any.
    pub fn payment(&self) -> Option<u64> {
        match self {
            Self::InitReputation => None,
            Self::CreateLoan { amount, .. } | Self::BackLoan { amount, .. } => Some(*amount),
            Self::Repay {
                repayment_amount, ..
            } => Some(*repayment_amount),
        }
    }

    /// Name of the payment field as the HTTP API spells it.
    fn payment_field(&self) -> &'static str {
        match self {
            Self::Repay { .. } => "repaymentAmount",
            _ => "amount",
        }
    }

    /// Payment calls must move a non-zero amount.
    pub fn validate(&self) -> ServiceResult<()> {
        match self.payment() {
            Some(0) => Err(ServiceError::InvalidParam(format!(
                "{} must be greater than 0",
                self.payment_field()
            ))),
            _ => Ok(()),
        }
    }
}

/// Unsigned transaction bytes plus what the caller may want to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    /// Base64 BCS `TransactionData`.
    pub transaction_bytes: String,
    /// The coin paying gas and, for payment calls, the amount.
    pub gas_coin: ObjectId,
    pub digest: String,
}

// ---------------------------------------------------------------------------
// MicroloanService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MicroloanService {
    ledger: Arc<dyn Ledger>,
    program: ProgramConfig,
}

impl MicroloanService {
    pub fn new(ledger: Arc<dyn Ledger>, program: ProgramConfig) -> Self {
        Self { ledger, program }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn program(&self) -> &ProgramConfig {
        &self.program
    }

    /// Builds the unsigned transaction for `call` sent by `sender`.
    pub async fn build(
        &self,
        sender: SuiAddress,
        call: MicroloanCall,
    ) -> ServiceResult<BuiltTransaction> {
        call.validate()?;
        let coins = self.ledger.coins(sender, &self.program.coin_type).await?;
        let required = required_balance(call.payment(), self.program.gas_budget)?;
        let coin = select_coin(&coins, required)?.object_ref();
        debug!(%sender, coins = coins.len(), gas_coin = %coin.object_id, "selected payment coin");

        let mut ptb = ProgrammableTransactionBuilder::new();
        let mut args = Vec::new();
        if let Some(amount) = call.payment() {
            args.push(ptb.split_gas(amount)?);
        }
        match &call {
            MicroloanCall::InitReputation => {}
            MicroloanCall::CreateLoan {
                interest_bps,
                due_epoch,
                ..
            } => {
                args.push(ptb.pure_u64(*interest_bps)?);
                args.push(ptb.pure_u64(*due_epoch)?);
            }
            MicroloanCall::BackLoan {
                loan_request_id, ..
            } => {
                args.push(self.object_arg(&mut ptb, *loan_request_id).await?);
            }
            MicroloanCall::Repay {
                loan_request_id,
                reputation_id,
                ..
            } => {
                args.push(self.object_arg(&mut ptb, *loan_request_id).await?);
                args.push(self.object_arg(&mut ptb, *reputation_id).await?);
            }
        }
        ptb.move_call(
            self.program.package_id,
            self.program.module.as_str(),
            call.function(),
            vec![],
            args,
        )?;

        let gas_price = self.ledger.reference_gas_price().await?;
        let tx = TransactionBuilder::new(ptb.finish())
            .sender(sender)
            .gas_payment(coin)
            .gas_price(gas_price)
            .gas_budget(self.program.gas_budget)
            .build()?;

        let built = BuiltTransaction {
            transaction_bytes: tx.to_base64()?,
            gas_coin: coin.object_id,
            digest: tx.digest()?,
        };
        info!(
            function = call.function(),
            %sender,
            gas_coin = %built.gas_coin,
            "built transaction"
        );
        Ok(built)
    }

    /// Resolves `id` into a transaction input: shared objects by initial
    /// shared version (mutable), everything else by reference.
    async fn object_arg(
        &self,
        ptb: &mut ProgrammableTransactionBuilder,
        id: ObjectId,
    ) -> ServiceResult<Argument> {
        let object = self.ledger.object(id).await?.ok_or_else(|| {
            BuildError::InvalidArgument(format!("object {id} does not exist"))
        })?;
        let arg = match object.owner {
            Some(Owner::Shared {
                initial_shared_version,
            }) => ObjectArg::SharedObject {
                id,
                initial_shared_version,
                mutable: true,
            },
            _ => ObjectArg::ImmOrOwnedObject(object.object_ref()),
        };
        Ok(ptb.object(arg)?)
    }

    /// The first reputation object owned by `owner`.
    pub async fn reputation(&self, owner: SuiAddress) -> ServiceResult<ReputationRecord> {
        let objects = self
            .ledger
            .owned_objects(owner, &self.program.reputation_type())
            .await?;
        let object = objects
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound(REPUTATION_NOT_FOUND))?;
        Ok(ReputationRecord {
            id: object.object_id,
            score: object.field("score").cloned().unwrap_or(Value::Null),
        })
    }

    /// The raw fields of a loan request. Objects of any other type are
    /// reported as not found.
    pub async fn loan_details(&self, id: ObjectId) -> ServiceResult<Value> {
        let expected = self.program.loan_request_type();
        match self.ledger.object(id).await? {
            Some(object) if object.is_type(&expected) => Ok(object.fields),
            _ => Err(ServiceError::NotFound(LOAN_REQUEST_NOT_FOUND)),
        }
    }

    /// Typed variant of [`loan_details`](Self::loan_details).
    pub async fn loan(&self, id: ObjectId) -> ServiceResult<Loan> {
        let fields = self.loan_details(id).await?;
        Ok(Loan::from_fields(id, &fields)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
