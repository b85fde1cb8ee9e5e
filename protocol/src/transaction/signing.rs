//! Transaction signing.
//!
//! Signing is a separate step from building: the server builds bytes for an
//! address it holds no key for, and the wallet signs them with the ephemeral
//! key of a zkLogin session. The wallet rebinds the sender before signing,
//! so whatever sender the builder used, the signature is over the final
//! bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::types::TransactionData;
use super::BuildResult;
use crate::crypto::keys::EphemeralKeypair;
use crate::zklogin::{ZkLoginInputs, ZkLoginSignature};

/// A transaction ready for `sui_executeTransactionBlock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Base64 BCS of the transaction data.
    pub tx_bytes: String,
    /// Base64 serialized signatures.
    pub signatures: Vec<String>,
    /// Digest the ledger will report for this transaction.
    pub digest: String,
}

/// Ed25519 user signature over the intent digest: `0x00 ‖ sig ‖ pk`.
pub fn sign_user(tx: &TransactionData, keypair: &EphemeralKeypair) -> BuildResult<Vec<u8>> {
    let digest = tx.signing_digest()?;
    Ok(keypair.sign_serialized(&digest))
}

/// Signs `tx` with a plain Ed25519 key.
pub fn sign_transaction(
    tx: &TransactionData,
    keypair: &EphemeralKeypair,
) -> BuildResult<SignedTransaction> {
    let user_signature = sign_user(tx, keypair)?;
    Ok(SignedTransaction {
        tx_bytes: tx.to_base64()?,
        signatures: vec![STANDARD.encode(user_signature)],
        digest: tx.digest()?,
    })
}

/// Signs `tx` with the session's ephemeral key and wraps the result in a
/// zkLogin composite signature valid through `max_epoch`.
pub fn sign_zklogin_transaction(
    tx: &TransactionData,
    keypair: &EphemeralKeypair,
    inputs: ZkLoginInputs,
    max_epoch: u64,
) -> BuildResult<SignedTransaction> {
    let user_signature = sign_user(tx, keypair)?;
    let signature = ZkLoginSignature {
        inputs,
        max_epoch,
        user_signature,
    };
    Ok(SignedTransaction {
        tx_bytes: tx.to_base64()?,
        signatures: vec![signature.to_base64()?],
        digest: tx.digest()?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::verify_ed25519;
    use crate::transaction::{ProgrammableTransactionBuilder, TransactionBuilder};
    use crate::types::{ObjectDigest, ObjectRef};
    use crate::zklogin::ZkLoginProof;

    fn unsigned() -> TransactionData {
        let mut ptb = ProgrammableTransactionBuilder::new();
        ptb.split_gas(10).unwrap();
        TransactionBuilder::new(ptb.finish())
            .sender("0xabc".parse().unwrap())
            .gas_payment(ObjectRef {
                object_id: "0xc0".parse().unwrap(),
                version: 1,
                digest: ObjectDigest::new([2u8; 32]),
            })
            .gas_price(1_000)
            .gas_budget(50_000_000)
            .build()
            .unwrap()
    }

    fn inputs() -> ZkLoginInputs {
        let proof: ZkLoginProof = serde_json::from_value(serde_json::json!({
            "proofPoints": {"a": ["1"], "b": [["2"]], "c": ["3"]},
            "issBase64Details": {"value": "aXNz", "indexMod4": 2},
            "headerBase64": "aGVhZGVy"
        }))
        .unwrap();
        proof.into_inputs("42".into())
    }

    #[test]
    fn user_signature_verifies_against_intent_digest() {
        let kp = EphemeralKeypair::from_seed(&[3u8; 32]);
        let tx = unsigned();
        let sig = sign_user(&tx, &kp).unwrap();
        assert_eq!(sig.len(), 97);
        assert_eq!(sig[0], 0x00);
        let raw: [u8; 64] = sig[1..65].try_into().unwrap();
        assert!(verify_ed25519(
            &kp.public_key_bytes(),
            &tx.signing_digest().unwrap(),
            &raw
        ));
        assert_eq!(&sig[65..], &kp.public_key_bytes());
    }

    #[test]
    fn zklogin_signature_embeds_user_signature() {
        let kp = EphemeralKeypair::from_seed(&[3u8; 32]);
        let tx = unsigned();
        let signed = sign_zklogin_transaction(&tx, &kp, inputs(), 9).unwrap();

        assert_eq!(signed.tx_bytes, tx.to_base64().unwrap());
        assert_eq!(signed.digest, tx.digest().unwrap());
        let bytes = STANDARD.decode(&signed.signatures[0]).unwrap();
        let decoded = ZkLoginSignature::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.max_epoch, 9);
        assert_eq!(decoded.inputs.address_seed, "42");
        assert_eq!(decoded.user_signature, sign_user(&tx, &kp).unwrap());
    }

    #[test]
    fn plain_signature_is_single_ed25519() {
        let kp = EphemeralKeypair::generate();
        let signed = sign_transaction(&unsigned(), &kp).unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert_eq!(STANDARD.decode(&signed.signatures[0]).unwrap().len(), 97);
    }
}
