//! # Chain Types
//!
//! The small vocabulary every other module speaks: addresses, object ids,
//! object digests, object references, owners and the two kinds of ledger
//! objects we read (coins and Move objects).
//!
//! Identifiers serialize two ways. Human-readable formats (JSON) get the
//! canonical `0x`-prefixed hex or base58 strings the JSON-RPC uses; binary
//! formats (BCS, bincode) get raw bytes, which is what the chain signs.

pub mod address;
pub mod object;

pub use address::{AddressError, ObjectId, SuiAddress};
pub use object::{Coin, LedgerObject, ObjectDigest, ObjectRef, Owner};

/// Serde helpers for `u64`/`u128` values the JSON-RPC sends as decimal
/// strings ("1000") but occasionally as plain numbers.
pub(crate) mod lenient_int {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }

    pub mod u128 {
        use super::*;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw128 {
            Num(u64),
            Text(String),
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
            match Raw128::deserialize(deserializer)? {
                Raw128::Num(n) => Ok(n as u128),
                Raw128::Text(s) => s.parse().map_err(de::Error::custom),
            }
        }
    }
}

/// Reads an unsigned integer out of a Move object field. Move `u64`s arrive
/// as JSON strings, smaller integers as numbers.
pub fn field_as_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
