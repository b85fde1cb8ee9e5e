//! In-memory ledger.
//!
//! A deterministic stand-in for a fullnode: coins and Move objects are
//! inserted by hand, queries answer from a `parking_lot::RwLock`, and
//! executed transactions are recorded rather than applied. The server,
//! wallet and integration tests all run against it.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ExecutionOutcome, ExecutionStatus, Ledger, LedgerError, LedgerResult};
use crate::config::SUI_COIN_TYPE;
use crate::crypto::hash::blake2b256;
use crate::transaction::SignedTransaction;
use crate::types::{Coin, LedgerObject, ObjectDigest, ObjectId, Owner, SuiAddress};

const DEFAULT_GAS_PRICE: u64 = 1_000;

#[derive(Debug, Default)]
struct State {
    coins: HashMap<SuiAddress, Vec<(String, Coin)>>,
    objects: BTreeMap<ObjectId, LedgerObject>,
    gas_price: u64,
    epoch: u64,
    unreachable: HashSet<SuiAddress>,
    execution_failure: Option<String>,
    executed: Vec<SignedTransaction>,
}

/// See the module docs.
#[derive(Debug)]
pub struct InMemoryLedger {
    state: RwLock<State>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                gas_price: DEFAULT_GAS_PRICE,
                ..State::default()
            }),
        }
    }

    /// Adds a SUI coin owned by `owner`.
    pub fn with_coin(self, owner: SuiAddress, coin: Coin) -> Self {
        self.insert_coin(owner, SUI_COIN_TYPE, coin);
        self
    }

    pub fn with_object(self, object: LedgerObject) -> Self {
        self.insert_object(object);
        self
    }

    pub fn with_epoch(self, epoch: u64) -> Self {
        self.state.write().epoch = epoch;
        self
    }

    pub fn with_gas_price(self, price: u64) -> Self {
        self.state.write().gas_price = price;
        self
    }

    pub fn insert_coin(&self, owner: SuiAddress, coin_type: &str, coin: Coin) {
        self.state
            .write()
            .coins
            .entry(owner)
            .or_default()
            .push((coin_type.to_string(), coin));
    }

    pub fn insert_object(&self, object: LedgerObject) {
        self.state.write().objects.insert(object.object_id, object);
    }

    /// Every query about `owner` fails with a transport error from now on.
    pub fn make_unreachable(&self, owner: SuiAddress) {
        self.state.write().unreachable.insert(owner);
    }

    /// The next executed transaction reports this failure.
    pub fn fail_next_execution(&self, message: impl Into<String>) {
        self.state.write().execution_failure = Some(message.into());
    }

    /// Transactions submitted so far, in order.
    pub fn executed(&self) -> Vec<SignedTransaction> {
        self.state.read().executed.clone()
    }

    fn check_reachable(state: &State, owner: SuiAddress) -> LedgerResult<()> {
        if state.unreachable.contains(&owner) {
            return Err(LedgerError::Transport(format!("{owner} is unreachable")));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn coins(&self, owner: SuiAddress, coin_type: &str) -> LedgerResult<Vec<Coin>> {
        let state = self.state.read();
        Self::check_reachable(&state, owner)?;
        Ok(state
            .coins
            .get(&owner)
            .map(|coins| {
                coins
                    .iter()
                    .filter(|(t, _)| t == coin_type)
                    .map(|(_, c)| c.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn balance(&self, owner: SuiAddress, coin_type: &str) -> LedgerResult<u128> {
        let coins = self.coins(owner, coin_type).await?;
        Ok(coins.iter().map(|c| u128::from(c.balance)).sum())
    }

    async fn owned_objects(
        &self,
        owner: SuiAddress,
        struct_type: &str,
    ) -> LedgerResult<Vec<LedgerObject>> {
        let state = self.state.read();
        Self::check_reachable(&state, owner)?;
        Ok(state
            .objects
            .values()
            .filter(|o| o.owner.as_ref().and_then(Owner::address) == Some(owner))
            .filter(|o| o.is_type(struct_type))
            .cloned()
            .collect())
    }

    async fn object(&self, id: ObjectId) -> LedgerResult<Option<LedgerObject>> {
        Ok(self.state.read().objects.get(&id).cloned())
    }

    async fn reference_gas_price(&self) -> LedgerResult<u64> {
        Ok(self.state.read().gas_price)
    }

    async fn latest_epoch(&self) -> LedgerResult<u64> {
        Ok(self.state.read().epoch)
    }

    async fn execute(&self, tx: &SignedTransaction) -> LedgerResult<ExecutionOutcome> {
        let mut state = self.state.write();
        state.executed.push(tx.clone());
        let status = match state.execution_failure.take() {
            Some(error) => ExecutionStatus::Failure { error },
            None => ExecutionStatus::Success,
        };
        Ok(ExecutionOutcome {
            digest: tx.digest.clone(),
            status,
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Parses a fixture id.
///
/// # Panics
///
/// When `id` is not a valid object id. Fixtures are literals, so a typo is
/// a bug in the test that wrote it.
fn fixture_id(id: &str) -> ObjectId {
    id.parse()
        .unwrap_or_else(|e| panic!("invalid fixture object id {id:?}: {e}"))
}

/// A coin with a digest derived from its id, for fixtures.
///
/// # Panics
///
/// When `id` is not a valid object id.
pub fn mock_coin(id: &str, balance: u64) -> Coin {
    let coin_object_id = fixture_id(id);
    Coin {
        coin_object_id,
        version: 1,
        digest: ObjectDigest::new(blake2b256(coin_object_id.as_bytes())),
        balance,
    }
}

/// A Move object with the given type, owner and fields, for fixtures.
///
/// # Panics
///
/// When `id` is not a valid object id.
pub fn mock_object(
    id: &str,
    type_: impl Into<String>,
    owner: Owner,
    fields: serde_json::Value,
) -> LedgerObject {
    let object_id = fixture_id(id);
    LedgerObject {
        object_id,
        version: 1,
        digest: ObjectDigest::new(blake2b256(object_id.as_bytes())),
        type_: Some(type_.into()),
        owner: Some(owner),
        fields,
    }
}
