//! Runtime configuration sourced from environment variables.

use std::time::Duration;

use scan_guard_probe::{ProbeConfig, RetryPolicy};

use crate::AppError;

/// Per-attempt probe timeout in milliseconds.
pub const ENV_PROBE_TIMEOUT_MS: &str = "SCAN_GUARD_PROBE_TIMEOUT_MS";
/// Overall classification deadline in milliseconds.
pub const ENV_PROBE_DEADLINE_MS: &str = "SCAN_GUARD_PROBE_DEADLINE_MS";
/// Retries after the first probe attempt.
pub const ENV_PROBE_RETRIES: &str = "SCAN_GUARD_PROBE_RETRIES";
/// Sandbox preview kill-switch.
pub const ENV_SANDBOX_ENABLED: &str = "SCAN_GUARD_SANDBOX_ENABLED";

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Probe timing bounds.
    pub probe: ProbeConfig,
    /// Whether sandbox previews may open.
    pub sandbox_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            sandbox_enabled: true,
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for unparsable or zero-valued bounds.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; unset keys keep defaults.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for unparsable or zero-valued bounds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = ProbeConfig::default();

        let per_probe_timeout = match lookup(ENV_PROBE_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse_u64(ENV_PROBE_TIMEOUT_MS, &raw)?),
            None => defaults.per_probe_timeout,
        };
        let overall_deadline = match lookup(ENV_PROBE_DEADLINE_MS) {
            Some(raw) => Duration::from_millis(parse_u64(ENV_PROBE_DEADLINE_MS, &raw)?),
            None => defaults.overall_deadline,
        };
        let retry = match lookup(ENV_PROBE_RETRIES) {
            Some(raw) => RetryPolicy {
                max_retries: u32::try_from(parse_u64(ENV_PROBE_RETRIES, &raw)?).map_err(|_| {
                    AppError::Config(format!("{ENV_PROBE_RETRIES} is out of range"))
                })?,
                ..defaults.retry
            },
            None => defaults.retry,
        };

        let probe = ProbeConfig::new(per_probe_timeout, overall_deadline, retry)
            .map_err(|error| AppError::Config(error.to_string()))?;

        Ok(Self {
            probe,
            sandbox_enabled: switch_enabled(lookup(ENV_SANDBOX_ENABLED).as_deref()),
        })
    }
}

/// Checks the sandbox kill-switch env var.
///
/// Semantics:
/// - Unset => previews enabled.
/// - `0`, `false`, `off` (case-insensitive) => previews disabled.
/// - Any other value => previews enabled.
pub fn sandbox_enabled_from_env() -> bool {
    switch_enabled(std::env::var(ENV_SANDBOX_ENABLED).ok().as_deref())
}

fn switch_enabled(value: Option<&str>) -> bool {
    match value {
        Some(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !matches!(normalized.as_str(), "0" | "false" | "off")
        }
        None => true,
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| AppError::Config(format!("{key}={raw:?}: {error}")))
}
