//! Test-network faucet client.
//!
//! `POST {"FixedAmountRequest": {"recipient": "0x…"}}` to the network's
//! `/v2/gas` endpoint. The faucet answers `{"status": "Success",
//! "coins_sent": [...]}` or a `Failure` status; rate limiting comes back as
//! HTTP 429.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use microloan_protocol::config::HTTP_TIMEOUT;
use microloan_protocol::types::{field_as_u64, SuiAddress};

use crate::error::{WalletError, WalletResult};

const SERVICE: &str = "faucet";

/// One coin the faucet transferred.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinSent {
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: u64,
    pub id: String,
    pub transfer_tx_digest: String,
}

fn lenient_amount<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    field_as_u64(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid coin amount: {value}")))
}

#[derive(Debug, Deserialize)]
struct FaucetResponse {
    status: Value,
    #[serde(default)]
    coins_sent: Option<Vec<CoinSent>>,
}

#[derive(Debug, Clone)]
pub struct FaucetClient {
    client: reqwest::Client,
    url: String,
}

impl FaucetClient {
    pub fn new(url: impl Into<String>) -> WalletResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| WalletError::http(SERVICE, e))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Asks the faucet to fund `recipient`. Returns the coins it sent.
    pub async fn request_gas(&self, recipient: SuiAddress) -> WalletResult<Vec<CoinSent>> {
        let body = json!({ "FixedAmountRequest": { "recipient": recipient.to_string() } });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::http(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WalletError::Service {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let parsed: FaucetResponse = response
            .json()
            .await
            .map_err(|e| WalletError::http(SERVICE, e))?;
        if parsed.status != Value::String("Success".into()) {
            return Err(WalletError::Service {
                service: SERVICE,
                status: status.as_u16(),
                message: parsed.status.to_string(),
            });
        }

        let coins = parsed.coins_sent.unwrap_or_default();
        info!(
            %recipient,
            coins = coins.len(),
            mist = coins.iter().fold(0u64, |acc, c| acc.saturating_add(c.amount)),
            "faucet funded account"
        );
        Ok(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn recipient() -> SuiAddress {
        "0xabc".parse().unwrap()
    }

    fn faucet(server: &MockServer) -> FaucetClient {
        FaucetClient::new(format!("{}/v2/gas", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn funded_account_reports_coins() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/gas"))
            .and(body_json(json!({
                "FixedAmountRequest": {"recipient": recipient().to_string()}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": "Success",
                "coins_sent": [
                    {"amount": 1_000_000_000u64, "id": "0x1", "transferTxDigest": "D1"},
                    {"amount": "1000000000", "id": "0x2", "transferTxDigest": "D1"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let coins = faucet(&server).request_gas(recipient()).await.unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[1].amount, 1_000_000_000);
        assert_eq!(coins[0].transfer_tx_digest, "D1");
    }

    #[tokio::test]
    async fn failure_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/gas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": {"Failure": {"internal": "faucet is dry"}}
            })))
            .mount(&server)
            .await;

        let err = faucet(&server).request_gas(recipient()).await.unwrap_err();
        assert!(err.to_string().contains("faucet is dry"));
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/gas"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
            .mount(&server)
            .await;

        match faucet(&server).request_gas(recipient()).await.unwrap_err() {
            WalletError::Service { status, message, .. } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Too many requests");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
