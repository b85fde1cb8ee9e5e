//! The composite zkLogin signature.
//!
//! The prover returns a Groth16 proof plus the JWT fragments it was computed
//! over ([`ZkLoginProof`]). The client adds the address seed
//! ([`ZkLoginInputs`]), wraps it with the max epoch and the ephemeral key's
//! serialized signature, BCS-encodes the lot and prefixes the zkLogin flag.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{ZkLoginError, ZkLoginResult};
use crate::crypto::keys::SignatureScheme;

/// Groth16 proof points as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPoints {
    pub a: Vec<String>,
    pub b: Vec<Vec<String>>,
    pub c: Vec<String>,
}

/// Base64 fragment of the JWT that contains the `iss` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssBase64Details {
    pub value: String,
    pub index_mod_4: u8,
}

/// What the prover service returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginProof {
    pub proof_points: ProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
}

impl ZkLoginProof {
    /// Attaches the address seed, producing signature inputs.
    pub fn into_inputs(self, address_seed: String) -> ZkLoginInputs {
        ZkLoginInputs {
            proof_points: self.proof_points,
            iss_base64_details: self.iss_base64_details,
            header_base64: self.header_base64,
            address_seed,
        }
    }
}

/// Proof plus address seed. Field order is the BCS layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginInputs {
    pub proof_points: ProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
    pub address_seed: String,
}

/// The signature submitted alongside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginSignature {
    pub inputs: ZkLoginInputs,
    pub max_epoch: u64,
    /// Serialized Ed25519 signature of the ephemeral key
    /// (`flag ‖ sig ‖ pk`).
    pub user_signature: Vec<u8>,
}

impl ZkLoginSignature {
    /// `0x05 ‖ BCS(self)`.
    pub fn to_bytes(&self) -> ZkLoginResult<Vec<u8>> {
        let body = bcs::to_bytes(self).map_err(|e| ZkLoginError::Encoding(e.to_string()))?;
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(SignatureScheme::ZkLogin.flag());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Base64 of [`to_bytes`](Self::to_bytes), the form the RPC accepts.
    pub fn to_base64(&self) -> ZkLoginResult<String> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Parses the serialized form back.
    pub fn from_bytes(bytes: &[u8]) -> ZkLoginResult<Self> {
        match bytes.split_first() {
            Some((flag, body)) if *flag == SignatureScheme::ZkLogin.flag() => {
                bcs::from_bytes(body).map_err(|e| ZkLoginError::Encoding(e.to_string()))
            }
            Some((flag, _)) => Err(ZkLoginError::Encoding(format!(
                "expected zkLogin flag, got {flag:#04x}"
            ))),
            None => Err(ZkLoginError::Encoding("empty signature".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proof() -> ZkLoginProof {
        serde_json::from_value(serde_json::json!({
            "proofPoints": {
                "a": ["1", "2", "1"],
                "b": [["3", "4"], ["5", "6"], ["1", "0"]],
                "c": ["7", "8", "1"]
            },
            "issBase64Details": {
                "value": "wiaXNzIjoiaHR0cHM6Ly9hY2NvdW50cy5nb29nbGUuY29tIiw",
                "indexMod4": 1
            },
            "headerBase64": "eyJhbGciOiJSUzI1NiJ9"
        }))
        .unwrap()
    }

    #[test]
    fn prover_json_parses() {
        let proof = sample_proof();
        assert_eq!(proof.proof_points.b.len(), 3);
        assert_eq!(proof.iss_base64_details.index_mod_4, 1);
    }

    #[test]
    fn signature_is_flagged_and_round_trips() {
        let sig = ZkLoginSignature {
            inputs: sample_proof().into_inputs("123456".into()),
            max_epoch: 12,
            user_signature: vec![0u8; 97],
        };
        let bytes = sig.to_bytes().unwrap();
        assert_eq!(bytes[0], 0x05);
        assert_eq!(ZkLoginSignature::from_bytes(&bytes).unwrap(), sig);

        let b64 = sig.to_base64().unwrap();
        assert_eq!(STANDARD.decode(b64).unwrap(), bytes);
    }

    #[test]
    fn from_bytes_rejects_wrong_flag() {
        assert!(ZkLoginSignature::from_bytes(&[0x00, 1, 2]).is_err());
        assert!(ZkLoginSignature::from_bytes(&[]).is_err());
    }
}
