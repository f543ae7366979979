//! Tracing setup: structured logging with span definitions.

pub mod spans;

use exprvec_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Env var consulted for the log filter.
pub const LOG_ENV_VAR: &str = "EXPRVEC_LOG";

/// Initialize the tracing subscriber with structured JSON output.
///
/// Respects the `EXPRVEC_LOG` environment variable for filtering.
/// Defaults to `info` level if not set. Returns `false` if a global
/// subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .try_init()
        .is_ok()
}

/// Initialize tracing with a custom filter string (for testing or embedding).
pub fn init_tracing_with_filter(filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .json()
        .try_init()
        .is_ok()
}

/// Initialize tracing from the observability config section.
/// `EXPRVEC_LOG` still wins over the configured level when set.
pub fn init_from_config(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
