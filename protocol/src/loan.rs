//! Typed snapshots of the microloan Move objects.
//!
//! The HTTP surface hands object fields back unmodified; these types exist
//! for the wallet, which wants numbers and addresses rather than whatever
//! shape the node's JSON renderer picked (`u64`s as strings, `Option`s as
//! `null` or `{"vec": [...]}`, `UID`s as `{"id": ...}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{field_as_u64, ObjectId, SuiAddress};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoanError {
    #[error("loan field {0} is missing or malformed")]
    Field(&'static str),
}

/// A loan request as last read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: ObjectId,
    /// Principal in MIST.
    pub amount: u64,
    pub interest_bps: u64,
    pub due_epoch: u64,
    pub backed: bool,
    pub backer: Option<SuiAddress>,
    pub requester: Option<SuiAddress>,
    pub escrow_id: Option<ObjectId>,
}

impl Loan {
    /// Parses the fields of a `LoanRequest` object. `id` is used when the
    /// fields do not carry their own UID.
    pub fn from_fields(id: ObjectId, fields: &Value) -> Result<Self, LoanError> {
        let number = |name: &'static str| {
            fields
                .get(name)
                .and_then(field_as_u64)
                .ok_or(LoanError::Field(name))
        };

        Ok(Self {
            id: fields.get("id").and_then(uid).unwrap_or(id),
            amount: number("amount")?,
            interest_bps: number("interest_bps")?,
            due_epoch: number("due_epoch")?,
            backed: fields
                .get("backed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            backer: fields.get("backer").and_then(optional_hex),
            requester: fields.get("requester").and_then(optional_hex),
            escrow_id: fields.get("escrow_id").and_then(optional_hex),
        })
    }

    /// Principal plus interest, rounded down, in MIST.
    pub fn amount_due(&self) -> u64 {
        let interest = u128::from(self.amount) * u128::from(self.interest_bps) / 10_000;
        self.amount
            .saturating_add(u64::try_from(interest).unwrap_or(u64::MAX))
    }
}

/// A reputation object: its id and the score exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationRecord {
    pub id: ObjectId,
    pub score: Value,
}

impl ReputationRecord {
    pub fn score_u64(&self) -> Option<u64> {
        field_as_u64(&self.score)
    }
}

fn uid(value: &Value) -> Option<ObjectId> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Object(map) => map.get("id").and_then(uid),
        _ => None,
    }
}

fn optional_hex<T: std::str::FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Object(map) => match map.get("vec") {
            Some(Value::Array(items)) => items.first().and_then(optional_hex),
            _ => map.get("id").and_then(optional_hex),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_node_rendering() {
        let fields = json!({
            "id": {"id": "0x55"},
            "amount": "1000000000",
            "interest_bps": "500",
            "due_epoch": 100,
            "backed": true,
            "backer": {"vec": ["0xb0b"]},
            "requester": "0xa11ce",
            "escrow_id": null
        });
        let loan = Loan::from_fields(ObjectId::ZERO, &fields).unwrap();
        assert_eq!(loan.id, "0x55".parse().unwrap());
        assert_eq!(loan.amount, 1_000_000_000);
        assert_eq!(loan.interest_bps, 500);
        assert_eq!(loan.due_epoch, 100);
        assert!(loan.backed);
        assert_eq!(loan.backer, Some("0xb0b".parse().unwrap()));
        assert_eq!(loan.requester, Some("0xa11ce".parse().unwrap()));
        assert_eq!(loan.escrow_id, None);
    }

    #[test]
    fn missing_amount_is_an_error() {
        let err = Loan::from_fields(ObjectId::ZERO, &json!({"interest_bps": 1})).unwrap_err();
        assert_eq!(err, LoanError::Field("amount"));
    }

    #[test]
    fn amount_due_adds_interest() {
        let loan = Loan::from_fields(
            "0x1".parse().unwrap(),
            &json!({"amount": "1000000000", "interest_bps": "500", "due_epoch": "9"}),
        )
        .unwrap();
        assert_eq!(loan.amount_due(), 1_050_000_000);
        assert!(!loan.backed);
    }

    #[test]
    fn reputation_score_is_kept_verbatim() {
        let rep = ReputationRecord {
            id: "0x3".parse().unwrap(),
            score: json!("17"),
        };
        assert_eq!(rep.score_u64(), Some(17));
        assert_eq!(serde_json::to_value(&rep).unwrap()["score"], json!("17"));
    }
}
