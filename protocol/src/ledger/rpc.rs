//! JSON-RPC client for a Sui fullnode.
//!
//! | Method                          | Used for                          |
//! |---------------------------------|-----------------------------------|
//! | `suix_getCoins`                 | payment coin selection            |
//! | `suix_getBalance`               | wallet balance display            |
//! | `suix_getOwnedObjects`          | reputation lookup                 |
//! | `sui_getObject`                 | loan lookup, object arg resolution|
//! | `suix_getReferenceGasPrice`     | gas price for built transactions  |
//! | `suix_getLatestSuiSystemState`  | current epoch for zkLogin expiry  |
//! | `sui_executeTransactionBlock`   | submitting signed transactions    |

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::{ExecutionOutcome, ExecutionStatus, Ledger, LedgerError, LedgerResult};
use crate::config::{Network, COIN_PAGE_SIZE, HTTP_TIMEOUT, MAX_COIN_PAGES};
use crate::transaction::SignedTransaction;
use crate::types::{
    field_as_u64, lenient_int, Coin, LedgerObject, ObjectDigest, ObjectId, Owner, SuiAddress,
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    data: Vec<T>,
    next_cursor: Option<String>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcCoin {
    coin_object_id: ObjectId,
    #[serde(with = "lenient_int")]
    version: u64,
    digest: ObjectDigest,
    #[serde(with = "lenient_int")]
    balance: u64,
}

impl From<RpcCoin> for Coin {
    fn from(c: RpcCoin) -> Self {
        Coin {
            coin_object_id: c.coin_object_id,
            version: c.version,
            digest: c.digest,
            balance: c.balance,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBalance {
    #[serde(deserialize_with = "lenient_int::u128::deserialize")]
    total_balance: u128,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Option<RpcObjectData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcObjectData {
    object_id: ObjectId,
    #[serde(with = "lenient_int")]
    version: u64,
    digest: ObjectDigest,
    #[serde(rename = "type")]
    type_: Option<String>,
    #[serde(default, deserialize_with = "known_owner")]
    owner: Option<Owner>,
    content: Option<RpcContent>,
}

#[derive(Debug, Deserialize)]
struct RpcContent {
    #[serde(rename = "type")]
    type_: Option<String>,
    #[serde(default)]
    fields: Value,
}

/// Owner kinds we do not model (consensus-owned and friends) read as `None`
/// instead of failing the whole response.
fn known_owner<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Owner>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

impl From<RpcObjectData> for LedgerObject {
    fn from(o: RpcObjectData) -> Self {
        let (content_type, fields) = match o.content {
            Some(c) => (c.type_, c.fields),
            None => (None, Value::Null),
        };
        LedgerObject {
            object_id: o.object_id,
            version: o.version,
            digest: o.digest,
            type_: o.type_.or(content_type),
            owner: o.owner,
            fields,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SystemState {
    #[serde(with = "lenient_int")]
    epoch: u64,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    digest: String,
    effects: Option<Effects>,
}

#[derive(Debug, Deserialize)]
struct Effects {
    status: ExecutionStatus,
}

// ---------------------------------------------------------------------------
// SuiRpcClient
// ---------------------------------------------------------------------------

/// JSON-RPC client bound to one fullnode URL.
#[derive(Debug)]
pub struct SuiRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    pub fn new(url: impl Into<String>) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn for_network(network: Network) -> LedgerResult<Self> {
        Self::new(network.fullnode_url())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(method, id, "json-rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{method}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "{method} failed with status {status}: {text}"
            )));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("{method}: {e}")))?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(LedgerError::InvalidResponse(format!(
                "{method}: neither result nor error"
            ))),
        }
    }
}

#[async_trait]
impl Ledger for SuiRpcClient {
    async fn coins(&self, owner: SuiAddress, coin_type: &str) -> LedgerResult<Vec<Coin>> {
        let mut coins = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_COIN_PAGES {
            let page: Page<RpcCoin> = self
                .call(
                    "suix_getCoins",
                    json!([owner, coin_type, cursor, COIN_PAGE_SIZE]),
                )
                .await?;
            coins.extend(page.data.into_iter().map(Coin::from));
            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        debug!(%owner, count = coins.len(), "listed coins");
        Ok(coins)
    }

    async fn balance(&self, owner: SuiAddress, coin_type: &str) -> LedgerResult<u128> {
        let balance: RpcBalance = self
            .call("suix_getBalance", json!([owner, coin_type]))
            .await?;
        Ok(balance.total_balance)
    }

    async fn owned_objects(
        &self,
        owner: SuiAddress,
        struct_type: &str,
    ) -> LedgerResult<Vec<LedgerObject>> {
        let query = json!({
            "filter": { "StructType": struct_type },
            "options": { "showContent": true, "showType": true, "showOwner": true },
        });
        let page: Page<ObjectResponse> = self
            .call("suix_getOwnedObjects", json!([owner, query, null, null]))
            .await?;
        Ok(page
            .data
            .into_iter()
            .filter_map(|r| r.data)
            .map(LedgerObject::from)
            .collect())
    }

    async fn object(&self, id: ObjectId) -> LedgerResult<Option<LedgerObject>> {
        let options = json!({ "showContent": true, "showType": true, "showOwner": true });
        let response: ObjectResponse = self.call("sui_getObject", json!([id, options])).await?;
        Ok(response.data.map(LedgerObject::from))
    }

    async fn reference_gas_price(&self) -> LedgerResult<u64> {
        let raw: Value = self.call("suix_getReferenceGasPrice", json!([])).await?;
        field_as_u64(&raw)
            .ok_or_else(|| LedgerError::InvalidResponse(format!("gas price {raw} is not a u64")))
    }

    async fn latest_epoch(&self) -> LedgerResult<u64> {
        let state: SystemState = self
            .call("suix_getLatestSuiSystemState", json!([]))
            .await?;
        Ok(state.epoch)
    }

    async fn execute(&self, tx: &SignedTransaction) -> LedgerResult<ExecutionOutcome> {
        let response: ExecuteResponse = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    tx.tx_bytes,
                    tx.signatures,
                    { "showEffects": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;

        let status = response
            .effects
            .map(|e| e.status)
            .ok_or_else(|| LedgerError::InvalidResponse("execution response has no effects".into()))?;
        debug!(digest = %response.digest, ?status, "executed transaction");
        Ok(ExecutionOutcome {
            digest: response.digest,
            status,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn digest_b58() -> String {
        ObjectDigest::new([8u8; 32]).to_base58()
    }

    fn ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn coins_follow_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "suix_getCoins", "params": [
                SuiAddress::ZERO, "0x2::sui::SUI", null, 50
            ]})))
            .respond_with(ok(json!({
                "data": [{"coinObjectId": "0x1", "version": "3", "digest": digest_b58(), "balance": "100"}],
                "nextCursor": "page2",
                "hasNextPage": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "suix_getCoins", "params": [
                SuiAddress::ZERO, "0x2::sui::SUI", "page2", 50
            ]})))
            .respond_with(ok(json!({
                "data": [{"coinObjectId": "0x2", "version": "4", "digest": digest_b58(), "balance": "250"}],
                "nextCursor": null,
                "hasNextPage": false
            })))
            .mount(&server)
            .await;

        let client = SuiRpcClient::new(server.uri()).unwrap();
        let coins = client.coins(SuiAddress::ZERO, "0x2::sui::SUI").await.unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[1].balance, 250);
        assert_eq!(coins[0].version, 3);
    }

    #[tokio::test]
    async fn object_parses_content_and_owner() {
        let server = MockServer::start().await;
        mount(
            &server,
            "sui_getObject",
            ok(json!({"data": {
                "objectId": "0x77",
                "version": "12",
                "digest": digest_b58(),
                "type": "0x9::microloan::LoanRequest",
                "owner": {"Shared": {"initial_shared_version": 5}},
                "content": {
                    "dataType": "moveObject",
                    "type": "0x9::microloan::LoanRequest",
                    "fields": {"amount": "1000", "backed": false}
                }
            }})),
        )
        .await;

        let client = SuiRpcClient::new(server.uri()).unwrap();
        let obj = client.object("0x77".parse().unwrap()).await.unwrap().unwrap();
        assert!(obj.is_type("0x9::microloan::LoanRequest"));
        assert_eq!(obj.owner, Some(Owner::Shared { initial_shared_version: 5 }));
        assert_eq!(obj.field("amount"), Some(&json!("1000")));
    }

    #[tokio::test]
    async fn missing_object_is_none() {
        let server = MockServer::start().await;
        mount(
            &server,
            "sui_getObject",
            ok(json!({"error": {"code": "notExists", "object_id": "0x77"}})),
        )
        .await;

        let client = SuiRpcClient::new(server.uri()).unwrap();
        assert!(client.object("0x77".parse().unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scalar_queries_accept_string_numbers() {
        let server = MockServer::start().await;
        mount(&server, "suix_getReferenceGasPrice", ok(json!("750"))).await;
        mount(&server, "suix_getLatestSuiSystemState", ok(json!({"epoch": "42"}))).await;
        mount(&server, "suix_getBalance", ok(json!({"totalBalance": "3000000000"}))).await;

        let client = SuiRpcClient::new(server.uri()).unwrap();
        assert_eq!(client.reference_gas_price().await.unwrap(), 750);
        assert_eq!(client.latest_epoch().await.unwrap(), 42);
        assert_eq!(
            client.balance(SuiAddress::ZERO, "0x2::sui::SUI").await.unwrap(),
            3_000_000_000
        );
    }

    #[tokio::test]
    async fn rpc_errors_surface() {
        let server = MockServer::start().await;
        mount(
            &server,
            "suix_getLatestSuiSystemState",
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": -32602, "message": "bad params"}
            })),
        )
        .await;
        mount(&server, "suix_getReferenceGasPrice", ResponseTemplate::new(503)).await;

        let client = SuiRpcClient::new(server.uri()).unwrap();
        assert!(matches!(
            client.latest_epoch().await,
            Err(LedgerError::Rpc { code: -32602, .. })
        ));
        assert!(matches!(
            client.reference_gas_price().await,
            Err(LedgerError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn execute_reports_failure_status() {
        let server = MockServer::start().await;
        mount(
            &server,
            "sui_executeTransactionBlock",
            ok(json!({
                "digest": "9xYz",
                "effects": {"status": {"status": "failure", "error": "InsufficientGas"}}
            })),
        )
        .await;

        let client = SuiRpcClient::new(server.uri()).unwrap();
        let tx = SignedTransaction {
            tx_bytes: "AAAA".into(),
            signatures: vec!["BBBB".into()],
            digest: "9xYz".into(),
        };
        let outcome = client.execute(&tx).await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.status,
            ExecutionStatus::Failure {
                error: "InsufficientGas".into()
            }
        );
    }
}
