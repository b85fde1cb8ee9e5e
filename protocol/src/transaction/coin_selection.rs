//! Payment coin selection.
//!
//! One coin pays for everything: it is the gas payment, and payment
//! operations split the transfer amount off it. It must therefore cover the
//! amount plus the gas budget (the budget alone for calls without payment).
//! We pick the smallest coin that covers that total, breaking ties by object
//! id, so the choice only depends on the ledger state and big coins stay
//! whole for big payments.

use super::{BuildError, BuildResult};
use crate::types::Coin;

/// Balance the gas coin needs: `payment + gas_budget`.
pub fn required_balance(payment: Option<u64>, gas_budget: u64) -> BuildResult<u64> {
    match payment {
        None => Ok(gas_budget),
        Some(amount) => amount
            .checked_add(gas_budget)
            .ok_or(BuildError::NoSuitableCoin { amount }),
    }
}

/// Returns the smallest coin with `balance >= amount`.
pub fn select_coin(coins: &[Coin], amount: u64) -> BuildResult<&Coin> {
    coins
        .iter()
        .filter(|c| c.balance >= amount)
        .min_by(|a, b| {
            a.balance
                .cmp(&b.balance)
                .then_with(|| a.coin_object_id.as_bytes().cmp(b.coin_object_id.as_bytes()))
        })
        .ok_or(BuildError::NoSuitableCoin { amount })
}
