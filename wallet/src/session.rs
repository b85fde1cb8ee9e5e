//! # Session Store
//!
//! Persists the login in progress ([`Setup`]) and the logged-in accounts
//! ([`Account`]) in a sled database under the wallet's data directory.
//!
//! | Tree      | Key       | Value                      |
//! |-----------|-----------|----------------------------|
//! | `session` | `version` | `u32` big-endian           |
//! | `session` | `state`   | `bincode(SessionState)`    |
//!
//! Every mutation is one sled transaction over the `state` key, so the store
//! is the single writer of session state. When the stored version differs
//! from [`SESSION_VERSION`], or the state no longer decodes, the stale data is
//! wiped on open.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Tree};
use tracing::{debug, warn};

use microloan_protocol::config::ADDRESS_PREFIX;
use microloan_protocol::zklogin::ZkLoginProof;

use crate::identity::Provider;

/// Bump whenever [`SessionState`]'s encoding changes.
pub const SESSION_VERSION: u32 = 1;

const SESSION_TREE: &str = "session";
const VERSION_KEY: &[u8] = b"version";
const STATE_KEY: &[u8] = b"state";

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("session serialization error: {0}")]
    Serialization(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A login that has been sent to the provider but not completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    pub provider: Provider,
    pub max_epoch: u64,
    /// Nonce randomness, decimal.
    pub randomness: String,
    /// Ephemeral private key, `suiprivkey` bech32.
    pub ephemeral_key: String,
    pub started_at: DateTime<Utc>,
}

/// A completed zkLogin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub provider: Provider,
    /// `0x`-prefixed hex address.
    pub address: String,
    pub zk_proof: ZkLoginProof,
    /// Ephemeral private key, `suiprivkey` bech32.
    pub ephemeral_key: String,
    pub salt: String,
    pub sub: String,
    pub aud: String,
    pub max_epoch: u64,
    pub logged_in_at: DateTime<Utc>,
}

impl Account {
    fn has_valid_address(&self) -> bool {
        self.address.starts_with(ADDRESS_PREFIX)
    }
}

/// Everything the store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub setup: Option<Setup>,
    /// Newest first.
    pub accounts: Vec<Account>,
}

impl SessionState {
    /// Adds `account` at the front, replacing any account with the same
    /// address. Returns `false` and changes nothing if the address is not
    /// `0x`-prefixed.
    pub fn insert_account(&mut self, account: Account) -> bool {
        if !account.has_valid_address() {
            return false;
        }
        self.accounts.retain(|a| a.address != account.address);
        self.accounts.insert(0, account);
        true
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Handle to the on-disk session. Cheap to clone; clones share the database.
#[derive(Debug, Clone)]
pub struct SessionStore {
    db: Db,
    tree: Tree,
}

impl SessionStore {
    /// Opens or creates the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// A store that lives in memory and disappears when dropped.
    pub fn open_temporary() -> SessionResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> SessionResult<Self> {
        let tree = db.open_tree(SESSION_TREE)?;
        let store = Self { db, tree };
        store.check_version()?;
        Ok(store)
    }

    /// Wipes the tree if it was written by another session version or
    /// holds a state that no longer decodes.
    fn check_version(&self) -> SessionResult<()> {
        let stored = self
            .tree
            .get(VERSION_KEY)?
            .and_then(|v| <[u8; 4]>::try_from(v.as_ref()).ok())
            .map(u32::from_be_bytes);

        let stale = match stored {
            Some(SESSION_VERSION) => match self.tree.get(STATE_KEY)? {
                Some(bytes) => decode_state(&bytes).is_err(),
                None => false,
            },
            Some(other) => {
                warn!(found = other, expected = SESSION_VERSION, "session version mismatch");
                true
            }
            None => !self.tree.is_empty(),
        };

        if stale {
            warn!("discarding stale session data");
            self.tree.clear()?;
        }
        if stale || stored.is_none() {
            self.tree
                .insert(VERSION_KEY, &SESSION_VERSION.to_be_bytes()[..])?;
            self.flush()?;
        }
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> SessionResult<SessionState> {
        match self.tree.get(STATE_KEY)? {
            Some(bytes) => decode_state(&bytes),
            None => Ok(SessionState::default()),
        }
    }

    pub fn setup(&self) -> SessionResult<Option<Setup>> {
        Ok(self.state()?.setup)
    }

    /// Accounts, newest first. Anything without a `0x` address is skipped.
    pub fn accounts(&self) -> SessionResult<Vec<Account>> {
        Ok(self
            .state()?
            .accounts
            .into_iter()
            .filter(Account::has_valid_address)
            .collect())
    }

    /// Applies `f` to the state as one atomic read-modify-write and returns
    /// its result. `f` may run more than once if sled retries the
    /// transaction, so it must not have side effects.
    pub fn update<T>(&self, f: impl Fn(&mut SessionState) -> T) -> SessionResult<T> {
        let result = self.tree.transaction(|tx| {
            let mut state = match tx.get(STATE_KEY)? {
                Some(bytes) => decode_state(&bytes).map_err(ConflictableTransactionError::Abort)?,
                None => SessionState::default(),
            };
            let out = f(&mut state);
            let bytes = encode_state(&state).map_err(ConflictableTransactionError::Abort)?;
            tx.insert(STATE_KEY, bytes)?;
            Ok(out)
        });

        let out = result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => SessionError::Sled(e),
        })?;
        self.flush()?;
        Ok(out)
    }

    /// Records a login in progress, replacing any earlier one.
    pub fn save_setup(&self, setup: Setup) -> SessionResult<()> {
        self.update(|state| state.setup = Some(setup.clone()))
    }

    /// Stores `account`. Returns `false` without writing anything if its
    /// address is not `0x`-prefixed.
    pub fn save_account(&self, account: Account) -> SessionResult<bool> {
        if !account.has_valid_address() {
            debug!(address = %account.address, "rejecting account without 0x address");
            return Ok(false);
        }
        self.update(|state| state.insert_account(account.clone()))
    }

    /// Stores `account` and consumes the pending setup in one update.
    /// Nothing changes if the address is rejected.
    pub fn finish_login(&self, account: Account) -> SessionResult<bool> {
        if !account.has_valid_address() {
            debug!(address = %account.address, "rejecting account without 0x address");
            return Ok(false);
        }
        self.update(|state| {
            state.setup = None;
            state.insert_account(account.clone())
        })
    }

    /// Removes the setup and every account.
    pub fn clear(&self) -> SessionResult<()> {
        self.tree.remove(STATE_KEY)?;
        self.flush()
    }

    /// Blocks until pending writes are durable.
    pub fn flush(&self) -> SessionResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn encode_state(state: &SessionState) -> SessionResult<Vec<u8>> {
    bincode::serialize(state).map_err(|e| SessionError::Serialization(e.to_string()))
}

fn decode_state(bytes: &[u8]) -> SessionResult<SessionState> {
    bincode::deserialize(bytes).map_err(|e| SessionError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
