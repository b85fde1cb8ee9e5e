//! # Prometheus Metrics
//!
//! Operational metrics for the API, scraped at `/metrics` on the metrics
//! port. Everything lives in a dedicated [`prometheus::Registry`] with the
//! `microloan` prefix.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Metric handles shared by all handlers.
#[derive(Clone)]
pub struct ServerMetrics {
    registry: Registry,
    /// Unsigned transactions returned, by operation.
    pub transactions_built_total: IntCounterVec,
    /// Build requests that ended in an error response, by operation.
    pub build_failures_total: IntCounterVec,
    /// Ledger queries answered, by query and outcome.
    pub queries_total: IntCounterVec,
    /// Handler latency in seconds, by endpoint.
    pub request_latency_seconds: HistogramVec,
}

impl ServerMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("microloan".into()), None)?;

        let transactions_built_total = IntCounterVec::new(
            Opts::new(
                "transactions_built_total",
                "Unsigned transactions built and returned",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(transactions_built_total.clone()))?;

        let build_failures_total = IntCounterVec::new(
            Opts::new(
                "build_failures_total",
                "Transaction build requests that failed",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(build_failures_total.clone()))?;

        let queries_total = IntCounterVec::new(
            Opts::new("queries_total", "Ledger queries served"),
            &["query", "outcome"],
        )?;
        registry.register(Box::new(queries_total.clone()))?;

        let request_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "request_latency_seconds",
                "Handler latency in seconds, including ledger round trips",
            )
            .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            transactions_built_total,
            build_failures_total,
            queries_total,
            request_latency_seconds,
        })
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<ServerMetrics>;

/// `GET /metrics`. Returns 500 if encoding fails.
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_metrics_carry_prefix_and_labels() {
        let metrics = ServerMetrics::new().unwrap();
        metrics
            .transactions_built_total
            .with_label_values(&["create-loan"])
            .inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("microloan_transactions_built_total{operation=\"create-loan\"} 1"));
    }
}
