//! Logging setup for binaries and tests embedding this crate

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initialize stdout logging
///
/// Uses the log level from the RUST_LOG environment variable, defaulting
/// to "info" if it is not set. Call once at process startup; a second
/// call panics because the global subscriber is already installed.
pub fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(env_filter),
        )
        .init();
}
