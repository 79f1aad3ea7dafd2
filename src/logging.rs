//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so that stdout carries only translated text.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding a filter directive, e.g. `tlstream=debug`.
pub const LOG_ENV: &str = "TLSTREAM_LOG";

/// Builds the filter: `TLSTREAM_LOG`, then `RUST_LOG`, then the default level.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "warn" };
    let directive = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_default();

    if directive.is_empty() {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level))
    }
}

/// Installs the global subscriber.
pub fn init(verbose: bool) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(verbose)
        .with_file(verbose)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
