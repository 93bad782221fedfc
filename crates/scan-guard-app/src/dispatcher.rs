//! Share and Open orchestration behind the verdict policy.

use std::sync::Arc;

use scan_guard_core::{Payload, ScanVerdict};
use scan_guard_sandbox::{
    ConfirmationPrompt, IsolatedRenderer, OpenOutcome, RendererEvent, SandboxGate, SessionState,
};
use scan_guard_ui::present;
use thiserror::Error;
use tracing::{info, warn};

use crate::AppError;

/// Native share collaborator.
pub trait ShareSurface: Send + Sync {
    /// Hands raw text to the platform share sheet.
    ///
    /// # Errors
    /// Returns [`ShareError`] when the platform reports a failure.
    fn share(&self, text: &str) -> Result<(), ShareError>;
}

/// Share collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    /// No share target is available on this device.
    #[error("no share target available")]
    Unavailable,
    /// Platform share call failed.
    #[error("share failed: {0}")]
    Platform(String),
}

/// Result of a share action. Failures are non-fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Payload handed to the share surface.
    Shared,
    /// Share surface failed; nothing else changed.
    Failed(String),
}

/// Drives Share and Open actions for one view.
pub struct ActionDispatcher<R: IsolatedRenderer> {
    gate: SandboxGate<R>,
    share_surface: Arc<dyn ShareSurface>,
    prompt: Arc<dyn ConfirmationPrompt + Send + Sync>,
    sandbox_enabled: bool,
}

impl<R: IsolatedRenderer> ActionDispatcher<R> {
    /// Creates a dispatcher around a closed gate.
    pub fn new(
        gate: SandboxGate<R>,
        share_surface: Arc<dyn ShareSurface>,
        prompt: Arc<dyn ConfirmationPrompt + Send + Sync>,
        sandbox_enabled: bool,
    ) -> Self {
        Self {
            gate,
            share_surface,
            prompt,
            sandbox_enabled,
        }
    }

    /// Forwards the raw payload to the share surface.
    pub fn share(&self, payload: &Payload) -> ShareOutcome {
        match self.share_surface.share(payload.raw()) {
            Ok(()) => {
                info!(
                    stage = "share",
                    action = "shared",
                    fingerprint = %payload.fingerprint(),
                );
                ShareOutcome::Shared
            }
            Err(error) => {
                warn!(
                    stage = "share",
                    action = "share_failed",
                    fingerprint = %payload.fingerprint(),
                    error = %error,
                );
                ShareOutcome::Failed(error.to_string())
            }
        }
    }

    /// Opens the payload in the sandbox, confirming first when the verdict
    /// policy requires it.
    ///
    /// # Errors
    /// Returns [`AppError::Sandbox`] when the gate fails to load the target.
    pub fn open_requested(
        &mut self,
        payload: &Payload,
        verdict: &ScanVerdict,
    ) -> Result<OpenOutcome, AppError> {
        if !self.sandbox_enabled {
            info!(stage = "sandbox", action = "open_disabled");
            return Ok(OpenOutcome::Disabled);
        }

        let affordances = present(verdict);
        let outcome = self.gate.open(
            payload.raw(),
            affordances.requires_confirmation,
            self.prompt.as_ref(),
        )?;
        info!(
            stage = "sandbox",
            action = "open_requested",
            fingerprint = %payload.fingerprint(),
            risk = verdict.risk_level.label(),
            requires_confirmation = affordances.requires_confirmation,
            outcome = ?outcome,
        );
        Ok(outcome)
    }

    /// Forwards one renderer event to the gate.
    ///
    /// # Errors
    /// Returns [`AppError::Sandbox`] for blocked navigations and load failures.
    pub fn renderer_event(&mut self, event: RendererEvent) -> Result<SessionState, AppError> {
        Ok(self.gate.on_renderer_event(event)?)
    }

    /// Closes the preview; idempotent.
    pub fn close_preview(&mut self) -> bool {
        self.gate.close()
    }

    /// Force-closes the preview for a dismissed view.
    pub fn dismiss(&mut self) -> bool {
        self.gate.dismiss()
    }

    /// Read access to the gate.
    pub fn gate(&self) -> &SandboxGate<R> {
        &self.gate
    }

    /// Whether previews are enabled.
    pub fn sandbox_enabled(&self) -> bool {
        self.sandbox_enabled
    }
}
