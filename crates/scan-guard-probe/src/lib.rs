#![warn(missing_docs)]
//! # scan-guard-probe
//!
//! ## Purpose
//! Runs reputation and redirect probes for scanned payloads without blocking
//! the interaction thread, and feeds their results into the classifier.
//!
//! ## Responsibilities
//! - Define the async [`ProbeBackend`] collaborator contract.
//! - Bound every probe by a per-attempt timeout and an overall deadline.
//! - Retry transient probe failures with capped, jittered backoff.
//! - Keep at most one classification in flight per payload instance.
//!
//! ## Data flow
//! [`ClassificationSlot::submit`] validates the payload, then spawns
//! [`run_probe`] on the tokio runtime. The resulting
//! [`scan_guard_core::ProbeResult`] is folded into a verdict and delivered
//! through [`PendingVerdict`].
//!
//! ## Ownership and lifetimes
//! Backends are shared through `Arc` so spawned probe tasks own their handle.
//! Payloads are moved into the task; nothing borrowed crosses the spawn.
//!
//! ## Error model
//! Deadline overruns, exhausted retries, and permanent failures all resolve to
//! [`ProbeResult::timed_out`], which the classifier maps to `Unknown`.
//! Superseded or dismissed classifications resolve to [`ProbeError::Cancelled`].
//!
//! ## Security and privacy notes
//! Probe services are untrusted: redirect chains are truncated to
//! [`REDIRECT_BOUND`] entries. Logs carry payload fingerprints only.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scan_guard_core::{
    MALFORMED_RULE_ID, Payload, ProbeResult, REDIRECT_BOUND, ScanVerdict, classify_explained,
    validate_payload,
};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Request forwarded to a probe backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Payload text to look up and follow.
    pub target: String,
    /// Maximum redirect hops the backend should follow.
    pub max_redirects: usize,
}

/// External reputation/redirect service.
pub trait ProbeBackend: Send + Sync + 'static {
    /// Looks up reputation and follows redirects for one target.
    fn probe(
        &self,
        request: ProbeRequest,
    ) -> impl Future<Output = Result<ProbeResult, ProbeError>> + Send;
}

/// Retry settings for transient probe failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Upper bound for the exponential delay (before jitter).
    pub max_delay_ms: u64,
    /// Maximum random jitter added to each delay.
    pub jitter_ms: u64,
}

impl RetryPolicy {
    /// Returns backoff delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let backoff = self
            .base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.max_delay_ms);
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rng.random_range(0..=self.jitter_ms)
        };
        Duration::from_millis(backoff.saturating_add(jitter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 200,
            max_delay_ms: 1_000,
            jitter_ms: 50,
        }
    }
}

/// Timing bounds for one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Timeout for a single probe attempt.
    pub per_probe_timeout: Duration,
    /// Deadline across all attempts and backoff sleeps.
    pub overall_deadline: Duration,
    /// Retry behavior for transient failures.
    pub retry: RetryPolicy,
}

impl ProbeConfig {
    /// Creates validated probe configuration.
    ///
    /// # Errors
    /// Returns [`ProbeError::InvalidConfig`] when either bound is zero.
    pub fn new(
        per_probe_timeout: Duration,
        overall_deadline: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ProbeError> {
        if per_probe_timeout.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "per-probe timeout must be greater than zero".to_string(),
            ));
        }
        if overall_deadline.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "overall deadline must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            per_probe_timeout,
            overall_deadline,
            retry,
        })
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            per_probe_timeout: Duration::from_secs(3),
            overall_deadline: Duration::from_secs(8),
            retry: RetryPolicy::default(),
        }
    }
}

/// Retry classification for probe failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Failure may succeed on a later attempt.
    Retriable,
    /// Retrying cannot help.
    Permanent,
}

/// Classifies probe errors for retry decisions.
pub fn classify_probe_error(error: &ProbeError) -> FailureClass {
    match error {
        ProbeError::Timeout | ProbeError::Transport(_) | ProbeError::Unavailable => {
            FailureClass::Retriable
        }
        ProbeError::Rejected(_) | ProbeError::Cancelled | ProbeError::InvalidConfig(_) => {
            FailureClass::Permanent
        }
    }
}

/// How a probe run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Backend answered within bounds.
    Completed,
    /// Backend failed permanently or retries ran out.
    Failed(ProbeError),
    /// Overall deadline expired.
    DeadlineExceeded,
}

/// Probe result plus bookkeeping about how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Result handed to the classifier.
    pub result: ProbeResult,
    /// Backend attempts made.
    pub attempts: u32,
    /// Terminal outcome.
    pub outcome: ProbeOutcome,
}

/// Runs one bounded probe for `payload`.
///
/// Never fails: every failure path yields [`ProbeResult::timed_out`].
pub async fn run_probe<B: ProbeBackend>(
    backend: &B,
    payload: &Payload,
    config: &ProbeConfig,
) -> ProbeReport {
    let fingerprint = payload.fingerprint();
    let mut rng = StdRng::seed_from_u64(u64::from_str_radix(&fingerprint, 16).unwrap_or(0));
    let mut attempts = 0_u32;

    let bounded = tokio::time::timeout(config.overall_deadline, async {
        loop {
            attempts = attempts.saturating_add(1);
            let request = ProbeRequest {
                target: payload.raw().to_string(),
                max_redirects: REDIRECT_BOUND,
            };

            let error =
                match tokio::time::timeout(config.per_probe_timeout, backend.probe(request)).await {
                    Ok(Ok(result)) => return Ok(result),
                    Ok(Err(error)) => error,
                    Err(_) => ProbeError::Timeout,
                };

            if classify_probe_error(&error) == FailureClass::Permanent
                || attempts > config.retry.max_retries
            {
                return Err(error);
            }

            let delay = config.retry.delay_for_attempt(attempts, &mut rng);
            debug!(
                stage = "probe",
                action = "retry",
                fingerprint = %fingerprint,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
            );
            tokio::time::sleep(delay).await;
        }
    })
    .await;

    match bounded {
        Ok(Ok(mut result)) => {
            result.redirect_chain.truncate(REDIRECT_BOUND);
            ProbeReport {
                result,
                attempts,
                outcome: ProbeOutcome::Completed,
            }
        }
        Ok(Err(error)) => {
            warn!(
                stage = "probe",
                action = "failed",
                fingerprint = %fingerprint,
                attempts,
                error = %error,
            );
            ProbeReport {
                result: ProbeResult::timed_out(),
                attempts,
                outcome: ProbeOutcome::Failed(error),
            }
        }
        Err(_) => {
            warn!(
                stage = "probe",
                action = "deadline_exceeded",
                fingerprint = %fingerprint,
                attempts,
                deadline_ms = config.overall_deadline.as_millis() as u64,
            );
            ProbeReport {
                result: ProbeResult::timed_out(),
                attempts,
                outcome: ProbeOutcome::DeadlineExceeded,
            }
        }
    }
}

/// Verdict plus the evidence that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Classifier verdict.
    pub verdict: ScanVerdict,
    /// Id of the deciding rule.
    pub rule_id: &'static str,
    /// Probe report; `None` when the payload was rejected before probing.
    pub probe: Option<ProbeReport>,
}

/// Validates, probes, and classifies one payload.
pub async fn classify_payload<B: ProbeBackend>(
    backend: &B,
    payload: &Payload,
    config: &ProbeConfig,
) -> Classification {
    if let Err(error) = validate_payload(payload) {
        debug!(
            stage = "classify",
            action = "malformed",
            fingerprint = %payload.fingerprint(),
            error = %error,
        );
        return Classification {
            verdict: ScanVerdict::unknown(),
            rule_id: MALFORMED_RULE_ID,
            probe: None,
        };
    }

    let report = run_probe(backend, payload, config).await;
    let (verdict, rule_id) = classify_explained(payload, &report.result);
    info!(
        stage = "classify",
        action = "verdict",
        fingerprint = %payload.fingerprint(),
        risk = verdict.risk_level.label(),
        rule = rule_id,
        redirects = verdict.redirect_count,
    );

    Classification {
        verdict,
        rule_id,
        probe: Some(report),
    }
}

/// Handle to a submitted classification.
#[derive(Debug)]
pub struct PendingVerdict {
    generation: u64,
    receiver: oneshot::Receiver<Classification>,
}

impl PendingVerdict {
    /// Submission counter value this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the classification.
    ///
    /// # Errors
    /// Returns [`ProbeError::Cancelled`] when the classification was superseded
    /// or cancelled before completing.
    pub async fn wait(self) -> Result<Classification, ProbeError> {
        self.receiver.await.map_err(|_| ProbeError::Cancelled)
    }
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    handle: AbortHandle,
}

/// Single-flight classification runner for one payload instance.
///
/// Submitting again cancels the prior in-flight probe. Dropping the slot
/// cancels too.
pub struct ClassificationSlot<B: ProbeBackend> {
    backend: Arc<B>,
    config: ProbeConfig,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl<B: ProbeBackend> ClassificationSlot<B> {
    /// Creates an idle slot.
    pub fn new(backend: Arc<B>, config: ProbeConfig) -> Self {
        Self {
            backend,
            config,
            generation: 0,
            in_flight: None,
        }
    }

    /// Spawns classification for `payload`, cancelling any prior run.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, payload: Payload) -> PendingVerdict {
        self.cancel();
        self.generation = self.generation.saturating_add(1);
        let generation = self.generation;

        let (sender, receiver) = oneshot::channel();
        let backend = Arc::clone(&self.backend);
        let config = self.config.clone();
        let task = tokio::spawn(async move {
            let classification = classify_payload(backend.as_ref(), &payload, &config).await;
            if sender.send(classification).is_err() {
                debug!(
                    stage = "classify",
                    action = "receiver_dropped",
                    generation,
                );
            }
        });

        self.in_flight = Some(InFlight {
            generation,
            handle: task.abort_handle(),
        });

        PendingVerdict {
            generation,
            receiver,
        }
    }

    /// Aborts the in-flight classification, if any.
    ///
    /// Returns `true` when a still-running task was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) if !in_flight.handle.is_finished() => {
                in_flight.handle.abort();
                debug!(
                    stage = "classify",
                    action = "cancelled",
                    generation = in_flight.generation,
                );
                true
            }
            _ => false,
        }
    }

    /// Returns `true` while a submitted classification is still running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|in_flight| !in_flight.handle.is_finished())
    }

    /// Returns the number of submissions made so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<B: ProbeBackend> Drop for ClassificationSlot<B> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Deterministic in-process probe backend for demos and tests.
///
/// Flags targets containing a blocklist marker and reports one redirect hop
/// per redirect-marker occurrence.
#[derive(Debug)]
pub struct SyntheticProbeBackend {
    blocklist_markers: Vec<String>,
    redirect_markers: Vec<String>,
    latency: Duration,
    calls: AtomicUsize,
}

impl SyntheticProbeBackend {
    /// Creates backend with `danger` blocklist and `redirect` redirect markers.
    pub fn new() -> Self {
        Self {
            blocklist_markers: vec!["danger".to_string()],
            redirect_markers: vec!["redirect".to_string()],
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Replaces blocklist markers.
    pub fn with_blocklist_markers(mut self, markers: &[&str]) -> Self {
        self.blocklist_markers = markers.iter().map(|marker| marker.to_ascii_lowercase()).collect();
        self
    }

    /// Replaces redirect markers.
    pub fn with_redirect_markers(mut self, markers: &[&str]) -> Self {
        self.redirect_markers = markers.iter().map(|marker| marker.to_ascii_lowercase()).collect();
        self
    }

    /// Adds artificial latency to every probe.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns how many probes were served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticProbeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeBackend for SyntheticProbeBackend {
    async fn probe(&self, request: ProbeRequest) -> Result<ProbeResult, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let lowered = request.target.to_ascii_lowercase();
        let blocklist_hit = self
            .blocklist_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()));
        let hops: usize = self
            .redirect_markers
            .iter()
            .map(|marker| lowered.matches(marker.as_str()).count())
            .sum();

        Ok(ProbeResult {
            secure_transport: lowered.starts_with("https://"),
            blocklist_hit,
            redirect_chain: (1..=hops.min(request.max_redirects))
                .map(|hop| format!("{}#hop-{hop}", request.target))
                .collect(),
            probe_timed_out: false,
        })
    }
}

/// Probe layer error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Attempt exceeded its timeout.
    #[error("probe attempt timed out")]
    Timeout,
    /// Network or protocol failure.
    #[error("probe transport failure: {0}")]
    Transport(String),
    /// Service temporarily unavailable.
    #[error("probe service unavailable")]
    Unavailable,
    /// Service refused the request.
    #[error("probe rejected: {0}")]
    Rejected(String),
    /// Classification superseded or dismissed.
    #[error("classification cancelled")]
    Cancelled,
    /// Timing bounds are unusable.
    #[error("invalid probe config: {0}")]
    InvalidConfig(String),
}
