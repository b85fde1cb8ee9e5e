//! # CLI Interface
//!
//! Command-line structure for `microloan-server`: `serve`, `status` and
//! `version`. Every `serve` flag can also come from the environment.

use clap::{Parser, Subcommand};

use microloan_protocol::config::{
    Network, DEFAULT_API_PORT, DEFAULT_CORS_ORIGIN, DEFAULT_GAS_BUDGET, DEFAULT_METRICS_PORT,
    DEFAULT_MODULE_NAME, DEFAULT_PACKAGE_ID,
};
use microloan_protocol::types::ObjectId;

use crate::logging::LogFormat;

/// Microloan backend.
///
/// Builds unsigned transactions against the microloan Move package and
/// answers reputation and loan queries from a Sui fullnode.
#[derive(Parser, Debug)]
#[command(
    name = "microloan-server",
    about = "Microloan transaction builder and query API",
    version,
    propagate_version = true
)]
pub struct MicroloanServerCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API and metrics servers.
    Serve(ServeArgs),
    /// Query a running server's health endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port for the REST API.
    #[arg(long, env = "MICROLOAN_PORT", default_value_t = DEFAULT_API_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "MICROLOAN_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Sui network whose public fullnode is queried.
    #[arg(long, env = "MICROLOAN_NETWORK", default_value_t = Network::Testnet)]
    pub network: Network,

    /// Fullnode JSON-RPC URL; overrides the network's public endpoint.
    #[arg(long, env = "MICROLOAN_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Package id of the deployed microloan Move package.
    #[arg(long, env = "MICROLOAN_PACKAGE_ID", default_value_t = DEFAULT_PACKAGE_ID)]
    pub package_id: ObjectId,

    /// Move module holding the entry functions.
    #[arg(long, env = "MICROLOAN_MODULE", default_value = DEFAULT_MODULE_NAME)]
    pub module: String,

    /// Gas budget per built transaction, in MIST.
    #[arg(long, env = "MICROLOAN_GAS_BUDGET", default_value_t = DEFAULT_GAS_BUDGET)]
    pub gas_budget: u64,

    /// Browser origin allowed by CORS.
    #[arg(long, env = "MICROLOAN_CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origin: String,

    /// Log output format: pretty or json.
    #[arg(long, env = "MICROLOAN_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Base URL of the running server.
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    pub url: String,
}
