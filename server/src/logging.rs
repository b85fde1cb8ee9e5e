//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with configurable format (JSON or
//! pretty-printed) and environment-based filtering via `RUST_LOG`.
//!
//! All log output goes to stderr; stdout is reserved for command output.

use tracing_subscriber::{fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use microloan_protocol::config::LogFormat;

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. `RUST_LOG` overrides
/// `default_directives` when set, e.g.:
///
/// ```text
/// RUST_LOG=microloan_server=debug,microloan_protocol=trace,tower_http=info
/// ```
pub fn init_logging(default_directives: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tfmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tfmt::layer().json().with_writer(std::io::stderr).with_target(true))
                .init();
        }
    }

    tracing::debug!(%format, "logging initialized");
}
