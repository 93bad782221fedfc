//! Structured logging setup.
//!
//! The filter is read from `SCAN_GUARD_LOG` (same syntax as `RUST_LOG`) and
//! defaults to `info`. Output goes to stderr so stdout stays machine-readable.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::AppError;

/// Env var holding the log filter directive.
pub const ENV_LOG_FILTER: &str = "SCAN_GUARD_LOG";

/// Installs the global subscriber.
///
/// # Errors
/// Returns [`AppError::Telemetry`] when the directive is invalid or a global
/// subscriber is already installed.
pub fn init_tracing() -> Result<(), AppError> {
    let filter = match std::env::var(ENV_LOG_FILTER) {
        Ok(directive) => EnvFilter::try_new(directive)
            .map_err(|error| AppError::Telemetry(error.to_string()))?,
        Err(_) => EnvFilter::new("info"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .map_err(|error| AppError::Telemetry(error.to_string()))
}
