//! Diagnostics for the launcher itself.
//!
//! Events from console setup, config loading and the program spawn/wait go to
//! stderr, filtered by `RUST_LOG`. They never reach `trading_log.txt`: that
//! file only holds markers and the trading program's own output, so a
//! verbose `RUST_LOG` cannot disturb the marker/output ordering.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=launcher=debug cargo run -- --dir .
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
