//! The on-chain transaction model.
//!
//! These types mirror the chain's `TransactionData` enum tree closely enough
//! that `#[derive(Serialize, Deserialize)]` plus `bcs` produces byte-for-byte
//! the encoding validators expect. Variant order is the wire discriminant, so
//! never reorder variants, and never insert new ones anywhere but the end.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{BuildError, BuildResult};
use crate::crypto::hash::blake2b256_parts;
use crate::types::{ObjectId, ObjectRef, SuiAddress};

/// Intent prefix for user transactions: scope `TransactionData`, version 0,
/// app id Sui.
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Domain separator hashed in front of a transaction to form its digest.
const DIGEST_DOMAIN: &[u8] = b"TransactionData::";

// ---------------------------------------------------------------------------
// Move type tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTag {
    pub address: SuiAddress,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

// ---------------------------------------------------------------------------
// Programmable transactions
// ---------------------------------------------------------------------------

/// Reference to a value inside a programmable transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    /// The coin paying for gas.
    GasCoin,
    /// The n-th transaction input.
    Input(u16),
    /// The result of the n-th command.
    Result(u16),
    /// The m-th value of the n-th command's result tuple.
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
}

impl ObjectArg {
    pub fn id(&self) -> ObjectId {
        match self {
            ObjectArg::ImmOrOwnedObject(r) => r.object_id,
            ObjectArg::SharedObject { id, .. } => *id,
        }
    }
}

/// A transaction input: BCS-encoded pure bytes or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
    TransferObjects(Vec<Argument>, Argument),
    SplitCoins(Argument, Vec<Argument>),
    MergeCoins(Argument, Vec<Argument>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

impl ProgrammableTransaction {
    /// All Move calls in command order.
    pub fn move_calls(&self) -> impl Iterator<Item = &ProgrammableMoveCall> {
        self.commands.iter().filter_map(|c| match c {
            Command::MoveCall(call) => Some(call.as_ref()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

// ---------------------------------------------------------------------------
// TransactionData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: SuiAddress,
    /// MIST per gas unit.
    pub price: u64,
    /// Upper bound on gas units times price, in MIST.
    pub budget: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionExpiration {
    None,
    Epoch(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDataV1 {
    pub kind: TransactionKind,
    pub sender: SuiAddress,
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

/// An unsigned transaction, exactly as it is signed and submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    V1(TransactionDataV1),
}

impl TransactionData {
    fn v1(&self) -> &TransactionDataV1 {
        match self {
            TransactionData::V1(v1) => v1,
        }
    }

    pub fn sender(&self) -> SuiAddress {
        self.v1().sender
    }

    /// Rebinds the transaction to `sender`. The gas owner moves with it,
    /// since the signer pays.
    pub fn set_sender(&mut self, sender: SuiAddress) {
        let TransactionData::V1(v1) = self;
        v1.sender = sender;
        v1.gas_data.owner = sender;
    }

    pub fn gas_data(&self) -> &GasData {
        &self.v1().gas_data
    }

    pub fn programmable(&self) -> &ProgrammableTransaction {
        match &self.v1().kind {
            TransactionKind::ProgrammableTransaction(pt) => pt,
        }
    }

    pub fn to_bcs(&self) -> BuildResult<Vec<u8>> {
        bcs::to_bytes(self).map_err(|e| BuildError::Encoding(e.to_string()))
    }

    pub fn from_bcs(bytes: &[u8]) -> BuildResult<Self> {
        bcs::from_bytes(bytes).map_err(|e| BuildError::Encoding(e.to_string()))
    }

    pub fn to_base64(&self) -> BuildResult<String> {
        Ok(STANDARD.encode(self.to_bcs()?))
    }

    pub fn from_base64(encoded: &str) -> BuildResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| BuildError::Encoding(format!("transaction bytes are not base64: {e}")))?;
        Self::from_bcs(&bytes)
    }

    /// The digest a wallet signs: `Blake2b-256(intent ‖ bcs)`.
    pub fn signing_digest(&self) -> BuildResult<[u8; 32]> {
        let bytes = self.to_bcs()?;
        Ok(blake2b256_parts(&[&TRANSACTION_INTENT[..], &bytes[..]]))
    }

    /// The transaction digest the ledger reports, base58-encoded.
    pub fn digest(&self) -> BuildResult<String> {
        let bytes = self.to_bcs()?;
        let hash = blake2b256_parts(&[DIGEST_DOMAIN, &bytes[..]]);
        Ok(bs58::encode(hash).into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectDigest;

    fn sample() -> TransactionData {
        let coin = ObjectRef {
            object_id: "0xc0".parse().unwrap(),
            version: 7,
            digest: ObjectDigest::new([9u8; 32]),
        };
        TransactionData::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(ProgrammableTransaction {
                inputs: vec![CallArg::Pure(bcs::to_bytes(&5u64).unwrap())],
                commands: vec![Command::SplitCoins(
                    Argument::GasCoin,
                    vec![Argument::Input(0)],
                )],
            }),
            sender: "0xabc".parse().unwrap(),
            gas_data: GasData {
                payment: vec![coin],
                owner: "0xabc".parse().unwrap(),
                price: 1000,
                budget: 50_000_000,
            },
            expiration: TransactionExpiration::None,
        })
    }

    #[test]
    fn bcs_starts_with_version_and_kind_tags() {
        let bytes = sample().to_bcs().unwrap();
        // V1, ProgrammableTransaction, one input, Pure, eight bytes.
        assert_eq!(&bytes[..5], &[0, 0, 1, 0, 8]);
    }

    #[test]
    fn base64_decodes_to_same_transaction() {
        let tx = sample();
        let encoded = tx.to_base64().unwrap();
        assert_eq!(TransactionData::from_base64(&encoded).unwrap(), tx);
        assert!(TransactionData::from_base64("%%%").is_err());
        assert!(TransactionData::from_base64("AAAA").is_err());
    }

    #[test]
    fn set_sender_moves_gas_owner() {
        let mut tx = sample();
        let new_sender: SuiAddress = "0xdef".parse().unwrap();
        let before = tx.signing_digest().unwrap();
        tx.set_sender(new_sender);
        assert_eq!(tx.sender(), new_sender);
        assert_eq!(tx.gas_data().owner, new_sender);
        assert_ne!(tx.signing_digest().unwrap(), before);
    }

    #[test]
    fn digest_differs_from_signing_digest() {
        let tx = sample();
        let digest = tx.digest().unwrap();
        let decoded = bs58::decode(&digest).into_vec().unwrap();
        assert_eq!(decoded.len(), 32);
        assert_ne!(decoded.as_slice(), tx.signing_digest().unwrap().as_slice());
    }
}
