//! Wallet error type.

use thiserror::Error;

use microloan_protocol::crypto::KeyError;
use microloan_protocol::ledger::LedgerError;
use microloan_protocol::transaction::BuildError;
use microloan_protocol::zklogin::ZkLoginError;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    ZkLogin(#[from] ZkLoginError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid callback: {0}")]
    Callback(String),

    /// Transport failure talking to one of the HTTP services.
    #[error("{service} request failed: {message}")]
    Http {
        service: &'static str,
        message: String,
    },

    /// A service answered, but with an error.
    #[error("{service} returned {status}: {message}")]
    Service {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("no account matches {0}")]
    UnknownAccount(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl WalletError {
    pub(crate) fn http(service: &'static str, err: reqwest::Error) -> Self {
        WalletError::Http {
            service,
            message: err.to_string(),
        }
    }
}
