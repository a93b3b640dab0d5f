//! Logging setup utilities for the Hiroba chat cluster.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the library crates and the binary log at `default_log_level` unless the
/// `RUST_LOG` environment variable overrides the filter.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hiroba_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba_server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={},hiroba_server={},{}={},tower_http={}",
                    env!("CARGO_PKG_NAME").replace("-", "_"),
                    default_log_level,
                    default_log_level,
                    binary_name.replace("-", "_"),
                    default_log_level,
                    default_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
