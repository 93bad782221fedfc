#![warn(missing_docs)]
//! # scan-guard-app
//!
//! ## Purpose
//! Orchestrates classification, presentation, sharing, and sandboxed preview
//! for one scanned payload.
//!
//! ## Responsibilities
//! - Drive Share and Open actions behind the verdict policy.
//! - Own the per-view lifecycle: classify once per payload, cancel on
//!   replacement, and clean up everything on dismissal.
//! - Load runtime configuration and the sandbox kill-switch from env.
//! - Install structured logging and redact payloads for log output.
//!
//! ## Data flow
//! Decoder payload -> [`ScanView::classify`] -> verdict -> [`scan_guard_ui::ScanCard`]
//! -> user action -> [`ActionDispatcher`] -> share surface or sandbox gate.
//!
//! ## Ownership and lifetimes
//! A [`ScanView`] exclusively owns its classification slot and dispatcher, so
//! dropping or dismissing the view tears down probes and sessions together.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Share failures are
//! reported as [`ShareOutcome::Failed`] and never change state.
//!
//! ## Security and privacy notes
//! - Dangerous verdicts require explicit confirmation before preview.
//! - The `SCAN_GUARD_SANDBOX_ENABLED` kill-switch disables previews entirely.
//! - Logs carry fingerprints or [`redact_payload`] output, never raw secrets.

mod config;
mod dispatcher;
mod redaction;
mod telemetry;
mod view;

pub use config::{AppConfig, sandbox_enabled_from_env};
pub use dispatcher::{ActionDispatcher, ShareError, ShareOutcome, ShareSurface};
pub use redaction::redact_payload;
pub use telemetry::init_tracing;
pub use view::{DismissReport, ScanView};

use scan_guard_probe::ProbeError;
use scan_guard_sandbox::SandboxError;
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("SCAN_GUARD_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Sandbox gate failure; the gate is already closed.
    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),
    /// Classification did not complete.
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),
    /// Open requested before a verdict exists.
    #[error("verdict not available yet")]
    VerdictPending,
    /// Environment configuration is invalid.
    #[error("invalid config: {0}")]
    Config(String),
    /// Logging could not be installed.
    #[error("telemetry init failed: {0}")]
    Telemetry(String),
}
