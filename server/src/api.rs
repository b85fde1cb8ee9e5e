//! # REST API
//!
//! Builds the axum router for the microloan backend. Handlers validate the
//! request, hand it to the [`MicroloanService`], and translate the result.
//!
//! ## Endpoints
//!
//! | Method | Path                | Description                              |
//! |--------|---------------------|------------------------------------------|
//! | GET    | `/`                 | Banner                                   |
//! | GET    | `/health`           | Liveness probe                           |
//! | POST   | `/init-reputation`  | Unsigned `init_reputation` transaction   |
//! | POST   | `/create-loan`      | Unsigned `create_loan` transaction       |
//! | POST   | `/back-loan`        | Unsigned `back_loan` transaction         |
//! | POST   | `/repay`            | Unsigned `repay` transaction             |
//! | GET    | `/get-reputation`   | Reputation score of `?userAddress`       |
//! | GET    | `/get-loan-details` | Fields of loan request `?loanRequestId`  |

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use microloan_protocol::loan::ReputationRecord;
use microloan_protocol::service::{MicroloanCall, MicroloanService, ServiceError, ServiceResult};
use microloan_protocol::types::SuiAddress;

use crate::error::{ApiError, ApiResult};
use crate::metrics::SharedMetrics;
use crate::params::Params;

pub const BANNER: &str = "Microloan API is running!";

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state available to all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub service: MicroloanService,
    pub metrics: SharedMetrics,
    /// Browser origin allowed by CORS.
    pub cors_origin: HeaderValue,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/init-reputation", post(init_reputation_handler))
        .route("/create-loan", post(create_loan_handler))
        .route("/back-loan", post(back_loan_handler))
        .route("/repay", post(repay_handler))
        .route("/get-reputation", get(get_reputation_handler))
        .route("/get-loan-details", get(get_loan_details_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub success: bool,
    /// Base64 BCS of the unsigned transaction.
    pub transaction_bytes: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationResponse {
    pub success: bool,
    /// The `score` field exactly as the ledger rendered it.
    pub score: Value,
    pub reputation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoanDetailsResponse {
    pub success: bool,
    pub loan: Value,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root_handler() -> &'static str {
    BANNER
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /init-reputation` — `{userAddress}`.
async fn init_reputation_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<BuildResponse>> {
    let request = || -> Result<_, ServiceError> {
        let p = Params::from_body(&body)?;
        p.require(&["userAddress"])?;
        Ok((p.address("userAddress")?, MicroloanCall::InitReputation))
    };
    build(&state, "init-reputation", request()).await
}

/// `POST /create-loan` — `{amount, interestBps, dueEpoch, userAddress}`.
async fn create_loan_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<BuildResponse>> {
    let request = || -> Result<_, ServiceError> {
        let p = Params::from_body(&body)?;
        p.require(&["amount", "interestBps", "dueEpoch", "userAddress"])?;
        let call = MicroloanCall::CreateLoan {
            amount: p.u64("amount")?,
            interest_bps: p.u64("interestBps")?,
            due_epoch: p.u64("dueEpoch")?,
        };
        Ok((p.address("userAddress")?, call))
    };
    build(&state, "create-loan", request()).await
}

/// `POST /back-loan` — `{loanRequestId, amount, userAddress}`.
async fn back_loan_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<BuildResponse>> {
    let request = || -> Result<_, ServiceError> {
        let p = Params::from_body(&body)?;
        p.require(&["loanRequestId", "amount", "userAddress"])?;
        let call = MicroloanCall::BackLoan {
            loan_request_id: p.object_id("loanRequestId")?,
            amount: p.u64("amount")?,
        };
        Ok((p.address("userAddress")?, call))
    };
    build(&state, "back-loan", request()).await
}

/// `POST /repay` — `{loanRequestId, repaymentAmount, reputationId, userAddress}`.
async fn repay_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<BuildResponse>> {
    let request = || -> Result<_, ServiceError> {
        let p = Params::from_body(&body)?;
        p.require(&[
            "loanRequestId",
            "repaymentAmount",
            "reputationId",
            "userAddress",
        ])?;
        let call = MicroloanCall::Repay {
            loan_request_id: p.object_id("loanRequestId")?,
            repayment_amount: p.u64("repaymentAmount")?,
            reputation_id: p.object_id("reputationId")?,
        };
        Ok((p.address("userAddress")?, call))
    };
    build(&state, "repay", request()).await
}

/// Shared tail of the four build endpoints: run the build, record metrics.
async fn build(
    state: &AppState,
    operation: &'static str,
    request: Result<(SuiAddress, MicroloanCall), ServiceError>,
) -> ApiResult<Json<BuildResponse>> {
    let _timer = state
        .metrics
        .request_latency_seconds
        .with_label_values(&[operation])
        .start_timer();

    let result = match request {
        Ok((sender, call)) => state.service.build(sender, call).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(built) => {
            state
                .metrics
                .transactions_built_total
                .with_label_values(&[operation])
                .inc();
            Ok(Json(BuildResponse {
                success: true,
                transaction_bytes: built.transaction_bytes,
            }))
        }
        Err(e) => {
            state
                .metrics
                .build_failures_total
                .with_label_values(&[operation])
                .inc();
            Err(ApiError::from(e))
        }
    }
}

/// `GET /get-reputation?userAddress=0x...`
async fn get_reputation_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ReputationResponse>> {
    let _timer = state
        .metrics
        .request_latency_seconds
        .with_label_values(&["get-reputation"])
        .start_timer();

    let p = Params::from_query(query);
    let result = lookup_reputation(&state, &p).await;
    record_query(&state, "reputation", &result);

    let record = result?;
    Ok(Json(ReputationResponse {
        success: true,
        score: record.score,
        reputation_id: record.id.to_string(),
    }))
}

/// `GET /get-loan-details?loanRequestId=0x...`
async fn get_loan_details_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<LoanDetailsResponse>> {
    let _timer = state
        .metrics
        .request_latency_seconds
        .with_label_values(&["get-loan-details"])
        .start_timer();

    let p = Params::from_query(query);
    let result = lookup_loan(&state, &p).await;
    record_query(&state, "loan", &result);

    Ok(Json(LoanDetailsResponse {
        success: true,
        loan: result?,
    }))
}

async fn lookup_reputation(state: &AppState, p: &Params) -> ServiceResult<ReputationRecord> {
    p.require(&["userAddress"])?;
    state.service.reputation(p.address("userAddress")?).await
}

async fn lookup_loan(state: &AppState, p: &Params) -> ServiceResult<Value> {
    p.require(&["loanRequestId"])?;
    state.service.loan_details(p.object_id("loanRequestId")?).await
}

fn record_query<T>(state: &AppState, query: &str, result: &Result<T, ServiceError>) {
    let outcome = match result {
        Ok(_) => "found",
        Err(ServiceError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    state
        .metrics
        .queries_total
        .with_label_values(&[query, outcome])
        .inc();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
