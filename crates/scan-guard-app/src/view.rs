//! Per-view lifecycle for one scanned payload.

use scan_guard_core::{Payload, ScanVerdict};
use scan_guard_probe::{Classification, ClassificationSlot, PendingVerdict, ProbeBackend};
use scan_guard_sandbox::{IsolatedRenderer, OpenOutcome, RendererEvent, SessionState};
use scan_guard_ui::ScanCard;
use tracing::{debug, info};

use crate::AppError;
use crate::dispatcher::{ActionDispatcher, ShareOutcome};

/// What [`ScanView::dismiss`] tore down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissReport {
    /// An in-flight probe was cancelled.
    pub probe_cancelled: bool,
    /// A sandbox session was force-closed.
    pub session_closed: bool,
}

/// Hosting view for one payload: classification, card, and actions.
pub struct ScanView<B: ProbeBackend, R: IsolatedRenderer> {
    payload: Payload,
    slot: ClassificationSlot<B>,
    dispatcher: ActionDispatcher<R>,
    verdict: Option<ScanVerdict>,
    expected_generation: Option<u64>,
}

impl<B: ProbeBackend, R: IsolatedRenderer> ScanView<B, R> {
    /// Creates a view; classification starts on demand.
    pub fn new(
        payload: Payload,
        slot: ClassificationSlot<B>,
        dispatcher: ActionDispatcher<R>,
    ) -> Self {
        Self {
            payload,
            slot,
            dispatcher,
            verdict: None,
            expected_generation: None,
        }
    }

    /// Payload shown by this view.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Latest verdict for the current payload.
    pub fn verdict(&self) -> Option<&ScanVerdict> {
        self.verdict.as_ref()
    }

    /// Dispatcher and gate state.
    pub fn dispatcher(&self) -> &ActionDispatcher<R> {
        &self.dispatcher
    }

    /// Whether a classification is still running.
    pub fn is_classifying(&self) -> bool {
        self.slot.is_in_flight()
    }

    /// Submits the current payload, cancelling any prior probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_classification(&mut self) -> PendingVerdict {
        let pending = self.slot.submit(self.payload.clone());
        self.expected_generation = Some(pending.generation());
        pending
    }

    /// Stores a finished classification unless it is stale.
    ///
    /// Returns `false` when `generation` no longer matches the latest
    /// submission for the current payload.
    pub fn apply_classification(
        &mut self,
        generation: u64,
        classification: &Classification,
    ) -> bool {
        if self.expected_generation != Some(generation) {
            debug!(stage = "view", action = "stale_verdict_dropped", generation);
            return false;
        }

        self.verdict = Some(classification.verdict);
        self.expected_generation = None;
        true
    }

    /// Classifies the current payload and stores the verdict.
    ///
    /// # Errors
    /// Returns [`AppError::Probe`] when the classification was cancelled.
    pub async fn classify(&mut self) -> Result<ScanVerdict, AppError> {
        let pending = self.start_classification();
        let generation = pending.generation();
        let classification = pending.wait().await?;
        self.apply_classification(generation, &classification);
        Ok(classification.verdict)
    }

    /// Swaps in a new payload, dropping the stale verdict and probe.
    pub fn replace_payload(&mut self, payload: Payload) {
        self.slot.cancel();
        self.payload = payload;
        self.verdict = None;
        self.expected_generation = None;
    }

    /// Read-only card for the presentation layer.
    pub fn card(&self) -> ScanCard {
        match &self.verdict {
            Some(verdict) => ScanCard::from_verdict(&self.payload, verdict),
            None => ScanCard::pending(&self.payload),
        }
    }

    /// Shares the raw payload.
    pub fn share(&self) -> ShareOutcome {
        self.dispatcher.share(&self.payload)
    }

    /// Opens the payload in the sandbox.
    ///
    /// # Errors
    /// - [`AppError::VerdictPending`] before a verdict exists.
    /// - [`AppError::Sandbox`] when the gate fails to load the target.
    pub fn open(&mut self) -> Result<OpenOutcome, AppError> {
        let verdict = self.verdict.ok_or(AppError::VerdictPending)?;
        self.dispatcher.open_requested(&self.payload, &verdict)
    }

    /// Forwards a renderer event to the gate.
    ///
    /// # Errors
    /// Returns [`AppError::Sandbox`] for blocked navigations and load failures.
    pub fn renderer_event(&mut self, event: RendererEvent) -> Result<SessionState, AppError> {
        self.dispatcher.renderer_event(event)
    }

    /// Closes the preview; idempotent.
    pub fn close_preview(&mut self) -> bool {
        self.dispatcher.close_preview()
    }

    /// Tears the view down: cancels probes and force-closes the sandbox.
    pub fn dismiss(mut self) -> DismissReport {
        let report = DismissReport {
            probe_cancelled: self.slot.cancel(),
            session_closed: self.dispatcher.dismiss(),
        };
        info!(
            stage = "view",
            action = "dismissed",
            fingerprint = %self.payload.fingerprint(),
            probe_cancelled = report.probe_cancelled,
            session_closed = report.session_closed,
        );
        report
    }
}
