//! # Transaction Signing Client
//!
//! Turns the server's unsigned bytes into an executed transaction:
//!
//! ```text
//! base64 ─► TransactionData ─► set sender ─► ed25519 sign (ephemeral key)
//!        ─► zkLogin signature (proof + address seed + max epoch) ─► execute
//! ```
//!
//! The wallet does not second-guess the transaction's content; the chain
//! rejects anything the account cannot do.

use std::fmt;

use tracing::{info, warn};

use microloan_protocol::config::KEY_CLAIM_NAME;
use microloan_protocol::crypto::EphemeralKeypair;
use microloan_protocol::ledger::{ExecutionStatus, Ledger};
use microloan_protocol::transaction::{sign_zklogin_transaction, SignedTransaction, TransactionData};
use microloan_protocol::types::SuiAddress;
use microloan_protocol::zklogin::gen_address_seed;

use crate::error::{WalletError, WalletResult};
use crate::session::Account;

/// What the user is told after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Succeeded { digest: String },
    Failed { message: String },
}

impl TxStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TxStatus::Succeeded { .. })
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Succeeded { digest } => write!(f, "Transaction succeeded: {digest}"),
            TxStatus::Failed { message } => write!(f, "Transaction failed: {message}"),
        }
    }
}

/// Signs `tx_bytes` on behalf of `account`.
pub fn sign_for_account(tx_bytes: &str, account: &Account) -> WalletResult<SignedTransaction> {
    let sender: SuiAddress = account
        .address
        .parse()
        .map_err(|e| WalletError::UnknownAccount(format!("{}: {e}", account.address)))?;

    let mut tx = TransactionData::from_base64(tx_bytes)?;
    tx.set_sender(sender);

    let keypair = EphemeralKeypair::from_bech32(&account.ephemeral_key)?;
    let address_seed = gen_address_seed(&account.salt, KEY_CLAIM_NAME, &account.sub, &account.aud)?;
    let inputs = account.zk_proof.clone().into_inputs(address_seed);

    Ok(sign_zklogin_transaction(
        &tx,
        &keypair,
        inputs,
        account.max_epoch,
    )?)
}

/// Signs and executes, folding every failure into a [`TxStatus`].
pub async fn submit(ledger: &dyn Ledger, tx_bytes: &str, account: &Account) -> TxStatus {
    let outcome = async {
        let signed = sign_for_account(tx_bytes, account)?;
        Ok::<_, WalletError>(ledger.execute(&signed).await?)
    }
    .await;

    let status = match outcome {
        Ok(outcome) => match outcome.status {
            ExecutionStatus::Success => TxStatus::Succeeded {
                digest: outcome.digest,
            },
            ExecutionStatus::Failure { error } => TxStatus::Failed { message: error },
        },
        Err(e) => TxStatus::Failed {
            message: e.to_string(),
        },
    };

    if status.is_success() {
        info!(address = %account.address, "{status}");
    } else {
        warn!(address = %account.address, "{status}");
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages() {
        let ok = TxStatus::Succeeded {
            digest: "9xyz".into(),
        };
        let failed = TxStatus::Failed {
            message: "InsufficientGas".into(),
        };
        assert_eq!(ok.to_string(), "Transaction succeeded: 9xyz");
        assert_eq!(failed.to_string(), "Transaction failed: InsufficientGas");
        assert!(ok.is_success());
        assert!(!failed.is_success());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let account = crate::session::tests::sample_account("0xabc");
        assert!(sign_for_account("not base64!", &account).is_err());
    }
}
