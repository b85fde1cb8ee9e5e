//! `tracing` setup for the wallet binary.
//!
//! Output goes to stderr so command results on stdout stay scriptable.
//! `RUST_LOG` overrides the default directives.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use microloan_protocol::config::LogFormat;

/// Installs the global subscriber.
pub fn init_logging(default_directives: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
