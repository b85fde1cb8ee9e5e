//! Client for the microloan server.
//!
//! The server answers every request with either `{"success": true, ...}` or
//! `{"error": "<message>"}`; the error message is surfaced verbatim.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use microloan_protocol::config::HTTP_TIMEOUT;
use microloan_protocol::service::MicroloanCall;
use microloan_protocol::types::ObjectId;

use crate::error::{WalletError, WalletResult};

const SERVICE: &str = "backend";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildResponse {
    transaction_bytes: String,
}

/// A reputation as reported by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationView {
    /// Score exactly as the ledger rendered it.
    pub score: Value,
    pub reputation_id: ObjectId,
}

#[derive(Debug, Deserialize)]
struct LoanResponse {
    loan: Value,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> WalletResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| WalletError::http(SERVICE, e))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Asks the server for the unsigned transaction of `call` from `sender`.
    /// Returns the base64 transaction bytes.
    pub async fn build(&self, sender: &str, call: &MicroloanCall) -> WalletResult<String> {
        let (path, body) = request_for(sender, call);
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body);
        let response: BuildResponse = self.send(request).await?;
        Ok(response.transaction_bytes)
    }

    pub async fn reputation(&self, address: &str) -> WalletResult<ReputationView> {
        let request = self
            .client
            .get(format!("{}/get-reputation", self.base_url))
            .query(&[("userAddress", address)]);
        self.send(request).await
    }

    /// Fields of a loan request, unmodified.
    pub async fn loan(&self, loan_request_id: ObjectId) -> WalletResult<Value> {
        let request = self
            .client
            .get(format!("{}/get-loan-details", self.base_url))
            .query(&[("loanRequestId", loan_request_id.to_string())]);
        let response: LoanResponse = self.send(request).await?;
        Ok(response.loan)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> WalletResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| WalletError::http(SERVICE, e))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| WalletError::http(SERVICE, e))?;

        let succeeded = body.get("success").and_then(Value::as_bool) == Some(true);
        if !status.is_success() || !succeeded {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            return Err(WalletError::Service {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_value(body).map_err(|e| WalletError::Service {
            service: SERVICE,
            status: status.as_u16(),
            message: format!("unexpected response: {e}"),
        })
    }
}

/// Endpoint path and JSON body for `call`. Amounts go out as MIST integers.
fn request_for(sender: &str, call: &MicroloanCall) -> (&'static str, Value) {
    match call {
        MicroloanCall::InitReputation => ("/init-reputation", json!({ "userAddress": sender })),
        MicroloanCall::CreateLoan {
            amount,
            interest_bps,
            due_epoch,
        } => (
            "/create-loan",
            json!({
                "amount": amount,
                "interestBps": interest_bps,
                "dueEpoch": due_epoch,
                "userAddress": sender,
            }),
        ),
        MicroloanCall::BackLoan {
            loan_request_id,
            amount,
        } => (
            "/back-loan",
            json!({
                "loanRequestId": loan_request_id.to_string(),
                "amount": amount,
                "userAddress": sender,
            }),
        ),
        MicroloanCall::Repay {
            loan_request_id,
            repayment_amount,
            reputation_id,
        } => (
            "/repay",
            json!({
                "loanRequestId": loan_request_id.to_string(),
                "repaymentAmount": repayment_amount,
                "reputationId": reputation_id.to_string(),
                "userAddress": sender,
            }),
        ),
    }
}
