//! Addresses and object ids.
//!
//! Both are 32 bytes rendered as `0x` + 64 lowercase hex digits. Short
//! forms such as `0x2` or `0xabc` are accepted on input and left-padded
//! with zeros, the same normalization the chain applies.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, ADDRESS_PREFIX};

/// Errors from parsing an address or object id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("address has more than 64 hex digits: {0}")]
    TooLong(String),

    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}

/// Parses `0x`-prefixed hex of up to 64 digits into 32 bytes.
fn parse_hex_id(s: &str) -> Result<[u8; ADDRESS_LENGTH], AddressError> {
    let digits = s
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex(s.to_string()));
    }
    if digits.len() > ADDRESS_LENGTH * 2 {
        return Err(AddressError::TooLong(s.to_string()));
    }
    let padded = format!("{digits:0>width$}", width = ADDRESS_LENGTH * 2);
    let mut out = [0u8; ADDRESS_LENGTH];
    hex::decode_to_slice(&padded, &mut out).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
    Ok(out)
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; ADDRESS_LENGTH]);

        impl $name {
            pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

            pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("{}{}", ADDRESS_PREFIX, hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex_id(s.trim()).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_hex())
                } else {
                    self.0.serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    s.parse().map_err(de::Error::custom)
                } else {
                    <[u8; ADDRESS_LENGTH]>::deserialize(deserializer).map(Self)
                }
            }
        }
    };
}

hex_id!(
    /// A Sui account address.
    SuiAddress
);

hex_id!(
    /// The id of an on-chain object (coin, loan request, reputation,
    /// package).
    ObjectId
);

impl From<SuiAddress> for ObjectId {
    fn from(addr: SuiAddress) -> Self {
        ObjectId(addr.0)
    }
}
