// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Microloan Server
//!
//! Entry point for the `microloan-server` binary. Parses CLI arguments,
//! initializes logging and metrics, connects to a Sui fullnode, and serves
//! the REST API.
//!
//! - `serve`   — start the API and metrics servers
//! - `status`  — query a running server's health endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod error;
mod logging;
mod metrics;
mod params;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use tokio::signal;

use microloan_protocol::config::{ProgramConfig, SUI_COIN_TYPE};
use microloan_protocol::ledger::SuiRpcClient;
use microloan_protocol::service::MicroloanService;

use cli::{Commands, MicroloanServerCli};
use metrics::ServerMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MicroloanServerCli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the API server and the metrics endpoint, and runs until a
/// shutdown signal arrives.
async fn serve(args: cli::ServeArgs) -> Result<()> {
    logging::init_logging(
        "microloan_server=info,microloan_protocol=info,tower_http=debug",
        args.log_format,
    );

    let rpc_url = args
        .rpc_url
        .clone()
        .unwrap_or_else(|| args.network.fullnode_url().to_string());

    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        network = %args.network,
        rpc_url = %rpc_url,
        package_id = %args.package_id,
        "starting microloan-server"
    );

    // --- Ledger ---
    let ledger = SuiRpcClient::new(rpc_url).context("failed to create fullnode client")?;

    // --- Service ---
    let program = ProgramConfig {
        package_id: args.package_id,
        module: args.module.clone(),
        coin_type: SUI_COIN_TYPE.to_string(),
        gas_budget: args.gas_budget,
    };
    let service = MicroloanService::new(Arc::new(ledger), program);

    // --- Metrics ---
    let server_metrics = Arc::new(ServerMetrics::new().context("failed to register metrics")?);

    // --- Application state ---
    let cors_origin = HeaderValue::from_str(&args.cors_origin)
        .with_context(|| format!("invalid CORS origin: {}", args.cors_origin))?;
    let app_state = api::AppState {
        service,
        metrics: Arc::clone(&server_metrics),
        cors_origin,
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&server_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("microloan-server stopped");
    Ok(())
}

/// Queries a running server's health endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?;
    let status = response.status();
    let body = response.text().await.context("failed to read response")?;
    println!("{} {}", status, body);
    Ok(())
}

fn print_version() {
    println!("microloan-server {}", env!("CARGO_PKG_VERSION"));
    println!("rustc            {}", rustc_version());
}

fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed, that branch never completes and the
/// other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
