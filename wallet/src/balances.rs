//! Balance refresh.
//!
//! Every account is queried concurrently. An account whose query fails is
//! logged and left out of the result; the others are still reported.

use std::collections::BTreeMap;

use futures::future::join_all;
use tracing::warn;

use microloan_protocol::ledger::Ledger;
use microloan_protocol::types::SuiAddress;

use crate::session::Account;

/// Total balance of `coin_type` for each account, keyed by address, in MIST.
pub async fn refresh_balances(
    ledger: &dyn Ledger,
    accounts: &[Account],
    coin_type: &str,
) -> BTreeMap<String, u128> {
    let queries = accounts.iter().map(|account| async move {
        let balance = match account.address.parse::<SuiAddress>() {
            Ok(owner) => ledger.balance(owner, coin_type).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        (account.address.clone(), balance)
    });

    join_all(queries)
        .await
        .into_iter()
        .filter_map(|(address, balance)| match balance {
            Ok(balance) => Some((address, balance)),
            Err(error) => {
                warn!(%address, %error, "balance fetch failed");
                None
            }
        })
        .collect()
}
