//! HTTP clients for the two zkLogin services.
//!
//! - **Salt service**: `POST {jwt}` → `{salt}`. The salt is a decimal
//!   integer, sent as a string or a number depending on the service.
//! - **Prover**: `POST` the JWT, salt, ephemeral key and nonce inputs →
//!   a Groth16 proof ([`ZkLoginProof`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use microloan_protocol::config::{HTTP_TIMEOUT, KEY_CLAIM_NAME};
use microloan_protocol::zklogin::ZkLoginProof;

use crate::error::{WalletError, WalletResult};

/// Body sent to the prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub max_epoch: u64,
    pub jwt_randomness: String,
    pub extended_ephemeral_public_key: String,
    pub jwt: String,
    pub salt: String,
    pub key_claim_name: String,
}

impl ProofRequest {
    pub fn new(
        jwt: impl Into<String>,
        salt: impl Into<String>,
        max_epoch: u64,
        jwt_randomness: impl Into<String>,
        extended_ephemeral_public_key: impl Into<String>,
    ) -> Self {
        Self {
            max_epoch,
            jwt_randomness: jwt_randomness.into(),
            extended_ephemeral_public_key: extended_ephemeral_public_key.into(),
            jwt: jwt.into(),
            salt: salt.into(),
            key_claim_name: KEY_CLAIM_NAME.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaltResponse {
    salt: Value,
}

#[derive(Debug, Clone)]
pub struct ZkServices {
    client: reqwest::Client,
    salt_url: String,
    prover_url: String,
}

impl ZkServices {
    pub fn new(salt_url: impl Into<String>, prover_url: impl Into<String>) -> WalletResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| WalletError::http("zk services", e))?;
        Ok(Self {
            client,
            salt_url: salt_url.into(),
            prover_url: prover_url.into(),
        })
    }

    /// Fetches the user salt for `jwt`, as a decimal string.
    pub async fn fetch_salt(&self, jwt: &str) -> WalletResult<String> {
        let response: SaltResponse = self
            .post_json("salt service", &self.salt_url, &serde_json::json!({ "jwt": jwt }))
            .await?;
        let salt = match response.salt {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => {
                return Err(WalletError::Service {
                    service: "salt service",
                    status: 200,
                    message: format!("unexpected salt value: {other}"),
                })
            }
        };
        debug!("salt received");
        Ok(salt)
    }

    /// Requests a zkLogin proof.
    pub async fn fetch_proof(&self, request: &ProofRequest) -> WalletResult<ZkLoginProof> {
        let proof = self.post_json("prover", &self.prover_url, request).await?;
        debug!(max_epoch = request.max_epoch, "proof received");
        Ok(proof)
    }

    async fn post_json<B, T>(&self, service: &'static str, url: &str, body: &B) -> WalletResult<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| WalletError::http(service, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WalletError::Service {
                service,
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| WalletError::http(service, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn services(server: &MockServer) -> ZkServices {
        ZkServices::new(
            format!("{}/get_salt", server.uri()),
            format!("{}/v1", server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn salt_accepts_string_or_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get_salt"))
            .and(body_json(serde_json::json!({"jwt": "a.b.c"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"salt": "129390038577185583942388216820280642146"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/get_salt"))
            .and(body_json(serde_json::json!({"jwt": "x.y.z"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"salt": 77})))
            .mount(&server)
            .await;

        let zk = services(&server);
        assert_eq!(
            zk.fetch_salt("a.b.c").await.unwrap(),
            "129390038577185583942388216820280642146"
        );
        assert_eq!(zk.fetch_salt("x.y.z").await.unwrap(), "77");
    }

    #[tokio::test]
    async fn salt_service_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get_salt"))
            .respond_with(ResponseTemplate::new(403).set_body_string("audience not allowed"))
            .mount(&server)
            .await;

        let err = services(&server).fetch_salt("a.b.c").await.unwrap_err();
        match err {
            WalletError::Service { status, message, .. } => {
                assert_eq!(status, 403);
                assert_eq!(message, "audience not allowed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn prover_receives_inputs_and_returns_proof() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(body_partial_json(serde_json::json!({
                "maxEpoch": 12,
                "jwtRandomness": "99",
                "extendedEphemeralPublicKey": "12345",
                "salt": "7",
                "keyClaimName": "sub"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "proofPoints": {"a": ["1"], "b": [["2"]], "c": ["3"]},
                "issBase64Details": {"value": "abc", "indexMod4": 2},
                "headerBase64": "hdr"
            })))
            .mount(&server)
            .await;

        let request = ProofRequest::new("a.b.c", "7", 12, "99", "12345");
        let proof = services(&server).fetch_proof(&request).await.unwrap();
        assert_eq!(proof.iss_base64_details.index_mod_4, 2);
        assert_eq!(proof.header_base64, "hdr");
    }
}
