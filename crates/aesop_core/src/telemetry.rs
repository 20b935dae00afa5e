//! Tracing subscriber setup for binaries and examples.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing output for development.
///
/// Installs a registry with an `EnvFilter` (respecting `RUST_LOG`) and a
/// human-readable fmt layer. Library code never calls this; binaries,
/// examples, and tests that want log output do.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    Ok(())
}
