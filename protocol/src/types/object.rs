//! Object references, owners, coins and Move objects.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::address::{ObjectId, SuiAddress};
use super::lenient_int;

// ---------------------------------------------------------------------------
// ObjectDigest
// ---------------------------------------------------------------------------

/// 32-byte digest of an object version.
///
/// JSON carries it base58-encoded. In BCS it is a length-prefixed byte
/// vector, not a fixed array, which is why this type has its own serde
/// impls instead of deriving.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectDigest([u8; 32]);

impl ObjectDigest {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl FromStr for ObjectDigest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| format!("invalid base58 digest {s}: {e}"))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| format!("digest must be 32 bytes, got {}", v.len()))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectDigest({})", self.to_base58())
    }
}

impl Serialize for ObjectDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_base58())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ObjectDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            let arr: [u8; 32] = bytes
                .try_into()
                .map_err(|v: Vec<u8>| de::Error::invalid_length(v.len(), &"32 bytes"))?;
            Ok(Self(arr))
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectRef
// ---------------------------------------------------------------------------

/// `(id, version, digest)` — everything the chain needs to pin an owned
/// object to the exact version a transaction was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
}

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// Ownership of an object, as reported by the JSON-RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    AddressOwner(SuiAddress),
    ObjectOwner(SuiAddress),
    Shared {
        #[serde(with = "lenient_int")]
        initial_shared_version: u64,
    },
    Immutable,
}

impl Owner {
    /// The owning account, if this object is owned by an address.
    pub fn address(&self) -> Option<SuiAddress> {
        match self {
            Owner::AddressOwner(a) => Some(*a),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Coin
// ---------------------------------------------------------------------------

/// A coin object of the payment currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub coin_object_id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
    /// Balance in MIST.
    pub balance: u64,
}

impl Coin {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            object_id: self.coin_object_id,
            version: self.version,
            digest: self.digest,
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerObject
// ---------------------------------------------------------------------------

/// A Move object as returned by an object query: identity, type, owner and
/// the decoded struct fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerObject {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
    /// Fully qualified Move type, when the node returned content.
    pub type_: Option<String>,
    pub owner: Option<Owner>,
    /// Struct fields exactly as the node rendered them.
    pub fields: serde_json::Value,
}

impl LedgerObject {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            object_id: self.object_id,
            version: self.version,
            digest: self.digest,
        }
    }

    /// Whether the object's Move type is exactly `expected`.
    pub fn is_type(&self, expected: &str) -> bool {
        self.type_.as_deref() == Some(expected)
    }

    /// Returns a single named field.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_length_prefixed_in_bcs() {
        let digest = ObjectDigest::new([7u8; 32]);
        let raw = bcs::to_bytes(&digest).unwrap();
        assert_eq!(raw.len(), 33);
        assert_eq!(raw[0], 32);
        let back: ObjectDigest = bcs::from_bytes(&raw).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn digest_is_base58_in_json() {
        let digest = ObjectDigest::new([1u8; 32]);
        let json = serde_json::to_value(digest).unwrap();
        assert_eq!(json, serde_json::json!(digest.to_base58()));
        assert!("not-base58-0OIl".parse::<ObjectDigest>().is_err());
        assert!(bs58::encode([1u8; 5])
            .into_string()
            .parse::<ObjectDigest>()
            .is_err());
    }

    #[test]
    fn owner_parses_rpc_shapes() {
        let shared: Owner =
            serde_json::from_value(serde_json::json!({"Shared": {"initial_shared_version": 42}}))
                .unwrap();
        assert_eq!(
            shared,
            Owner::Shared {
                initial_shared_version: 42
            }
        );

        let owned: Owner =
            serde_json::from_value(serde_json::json!({"AddressOwner": "0xabc"})).unwrap();
        assert_eq!(owned.address(), Some("0xabc".parse().unwrap()));

        let immutable: Owner = serde_json::from_value(serde_json::json!("Immutable")).unwrap();
        assert_eq!(immutable, Owner::Immutable);
        assert_eq!(immutable.address(), None);
    }

    #[test]
    fn shared_version_serializes_as_decimal_string() {
        let shared = Owner::Shared {
            initial_shared_version: 42,
        };
        let json = serde_json::to_value(&shared).unwrap();
        assert_eq!(json, serde_json::json!({"Shared": {"initial_shared_version": "42"}}));
        assert_eq!(serde_json::from_value::<Owner>(json).unwrap(), shared);
    }
}
