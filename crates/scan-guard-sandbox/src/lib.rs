#![warn(missing_docs)]
//! # scan-guard-sandbox
//!
//! ## Purpose
//! Controls the isolated rendering session used to preview a payload target.
//!
//! ## Responsibilities
//! - Model the `Closed -> Opening -> Active -> Closed` session lifecycle.
//! - Require an explicit user confirmation step when the verdict demands it.
//! - Enforce same-origin navigation bounded by [`REDIRECT_BOUND`].
//! - Release renderer resources exactly once per session.
//! - Surface lifecycle events through an injected [`SandboxObserver`].
//!
//! ## Data flow
//! Dispatcher calls [`SandboxGate::open`] -> [`IsolatedRenderer::load`] ->
//! renderer reports [`RendererEvent`]s -> [`SandboxGate::on_renderer_event`]
//! drives transitions and emits [`GateEvent`]s.
//!
//! ## Ownership and lifetimes
//! The gate exclusively owns the renderer and the single live session. Render
//! handles never leave the gate, so a session cannot outlive its release.
//!
//! ## Error model
//! Load failures and blocked navigations force the gate to `Closed` and are
//! returned as [`SandboxError`]. Closing is infallible and idempotent.
//!
//! ## Security and privacy notes
//! Session-local storage lives behind the render handle; releasing the handle
//! discards cookies, storage, and history before [`SandboxGate::close`]
//! returns.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use scan_guard_sandbox::{
//!     IsolatedRenderer, NavigationPolicy, RenderHandle, RendererError, SandboxGate,
//!     SessionState, TracingObserver,
//! };
//!
//! struct NullRenderer;
//!
//! impl IsolatedRenderer for NullRenderer {
//!     fn load(
//!         &mut self,
//!         _target: &str,
//!         _policy: &NavigationPolicy,
//!     ) -> Result<RenderHandle, RendererError> {
//!         Ok(RenderHandle(1))
//!     }
//!     fn release(&mut self, _handle: RenderHandle) {}
//! }
//!
//! let mut gate = SandboxGate::new(NullRenderer, Arc::new(TracingObserver));
//! assert_eq!(gate.state(), SessionState::Closed);
//! assert!(!gate.close());
//! ```

use std::sync::Arc;

use scan_guard_core::REDIRECT_BOUND;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::{Origin, Url};

/// Response headers surfaced to the user when the renderer reports them.
pub const SECURITY_HEADER_NAMES: &[&str] = &[
    "strict-transport-security",
    "x-frame-options",
    "x-content-type-options",
    "content-security-policy",
];

/// Sandbox session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session.
    Closed,
    /// Renderer is loading the target.
    Opening,
    /// Target loaded under enforced constraints.
    Active,
}

/// Read-only view of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Target being previewed, if any.
    pub target: Option<String>,
    /// Lifecycle state.
    pub state: SessionState,
    /// Allowed navigations performed so far.
    pub navigation_count: usize,
}

/// Navigation constraints handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPolicy {
    origin: Origin,
    max_redirects: usize,
}

impl NavigationPolicy {
    /// Builds policy pinned to the target's origin.
    ///
    /// # Errors
    /// Returns [`SandboxError::InvalidTarget`] when the target is not an
    /// absolute URL with a navigable origin.
    pub fn for_target(target: &str, max_redirects: usize) -> Result<Self, SandboxError> {
        let parsed = Url::parse(target)
            .map_err(|error| SandboxError::InvalidTarget(format!("not a url: {error}")))?;

        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(SandboxError::InvalidTarget(format!(
                "scheme '{}' has no navigable origin",
                parsed.scheme()
            )));
        }

        Ok(Self {
            origin,
            max_redirects,
        })
    }

    /// Allowed origin in ASCII serialization.
    pub fn origin(&self) -> String {
        self.origin.ascii_serialization()
    }

    /// Maximum number of allowed navigations.
    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Checks one navigation given how many were already allowed.
    ///
    /// # Errors
    /// Returns the [`BlockReason`] when the navigation must not proceed.
    pub fn check(&self, url: &str, navigations_so_far: usize) -> Result<(), BlockReason> {
        let parsed = Url::parse(url).map_err(|_| BlockReason::InvalidUrl)?;

        if parsed.origin() != self.origin {
            return Err(BlockReason::CrossOrigin {
                origin: parsed.origin().ascii_serialization(),
            });
        }

        if navigations_so_far >= self.max_redirects {
            return Err(BlockReason::RedirectBoundExceeded {
                bound: self.max_redirects,
            });
        }

        Ok(())
    }
}

/// Why a navigation was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockReason {
    /// Navigation left the allowed origin.
    #[error("navigation to foreign origin {origin}")]
    CrossOrigin {
        /// Origin the renderer tried to reach.
        origin: String,
    },
    /// Navigation count would exceed the bound.
    #[error("redirect bound of {bound} exceeded")]
    RedirectBoundExceeded {
        /// Configured bound.
        bound: usize,
    },
    /// Navigation target is not a URL.
    #[error("navigation target is not a valid url")]
    InvalidUrl,
}

/// Opaque renderer session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// Isolated rendering collaborator.
pub trait IsolatedRenderer: Send {
    /// Starts loading `target` under `policy`.
    ///
    /// # Errors
    /// Returns [`RendererError`] when the renderer cannot start a session.
    fn load(
        &mut self,
        target: &str,
        policy: &NavigationPolicy,
    ) -> Result<RenderHandle, RendererError>;

    /// Destroys the session and all its local storage.
    fn release(&mut self, handle: RenderHandle);
}

/// Events reported by the renderer for the live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererEvent {
    /// Target finished loading.
    Loaded {
        /// Response headers of the loaded document.
        headers: Vec<(String, String)>,
    },
    /// Renderer is about to navigate.
    Navigated {
        /// Navigation target.
        url: String,
    },
    /// Renderer enforced the policy itself.
    NavigationBlocked {
        /// Blocked target.
        url: String,
        /// Renderer-supplied reason.
        reason: String,
    },
    /// Loading failed.
    LoadFailed {
        /// Renderer-supplied reason.
        reason: String,
    },
}

/// Synchronous user decision point.
pub trait ConfirmationPrompt {
    /// Asks the user whether to open `target`.
    fn confirm(&self, target: &str) -> bool;
}

impl<F> ConfirmationPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, target: &str) -> bool {
        self(target)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Explicit close.
    UserClosed,
    /// Closed to make room for a new session.
    Replaced,
    /// Forced by a blocked navigation.
    NavigationBlocked,
    /// Forced by a load failure.
    LoadFailed,
    /// Hosting view went away.
    Dismissed,
}

/// Structured lifecycle events emitted to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// Session moved to `Opening`.
    Opening {
        /// Target.
        target: String,
    },
    /// Session moved to `Active`.
    Activated {
        /// Target.
        target: String,
    },
    /// Session closed and released.
    Closed {
        /// Target.
        target: String,
        /// Cause.
        reason: CloseReason,
    },
    /// `navigation-blocked`.
    NavigationBlocked {
        /// Session target.
        target: String,
        /// Blocked URL.
        url: String,
        /// Reason.
        reason: String,
    },
    /// `load-failed`.
    LoadFailed {
        /// Target.
        target: String,
        /// Reason.
        reason: String,
    },
}

/// Receives gate lifecycle events.
pub trait SandboxObserver: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &GateEvent);
}

/// Observer that forwards gate events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SandboxObserver for TracingObserver {
    fn on_event(&self, event: &GateEvent) {
        // Targets can embed secrets; only lifecycle facts are logged.
        match event {
            GateEvent::Opening { .. } => info!(stage = "sandbox", action = "opening"),
            GateEvent::Activated { .. } => info!(stage = "sandbox", action = "activated"),
            GateEvent::Closed { reason, .. } => {
                info!(stage = "sandbox", action = "closed", reason = ?reason)
            }
            GateEvent::NavigationBlocked { reason, .. } => {
                warn!(stage = "sandbox", action = "navigation_blocked", reason = %reason)
            }
            GateEvent::LoadFailed { reason, .. } => {
                warn!(stage = "sandbox", action = "load_failed", reason = %reason)
            }
        }
    }
}

/// Result of an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Renderer is loading the target.
    Opening,
    /// User declined confirmation; nothing changed.
    Declined,
    /// Sandbox previews are switched off.
    Disabled,
}

#[derive(Debug)]
struct Session {
    target: String,
    state: SessionState,
    navigation_count: usize,
    handle: RenderHandle,
    policy: NavigationPolicy,
    security_headers: Vec<(String, String)>,
}

/// Single-session sandbox state machine.
pub struct SandboxGate<R: IsolatedRenderer> {
    renderer: R,
    observer: Arc<dyn SandboxObserver>,
    session: Option<Session>,
}

impl<R: IsolatedRenderer> SandboxGate<R> {
    /// Creates a closed gate.
    pub fn new(renderer: R, observer: Arc<dyn SandboxObserver>) -> Self {
        Self {
            renderer,
            observer,
            session: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Closed, |session| session.state)
    }

    /// Snapshot of the current session.
    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.session {
            Some(session) => SessionSnapshot {
                target: Some(session.target.clone()),
                state: session.state,
                navigation_count: session.navigation_count,
            },
            None => SessionSnapshot {
                target: None,
                state: SessionState::Closed,
                navigation_count: 0,
            },
        }
    }

    /// Security headers reported for the active session.
    pub fn security_headers(&self) -> &[(String, String)] {
        self.session
            .as_ref()
            .map(|session| session.security_headers.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the owned renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Opens a session for `target`.
    ///
    /// When `requires_confirmation` is set, `prompt` is asked first; declining
    /// leaves the gate untouched. Any live session is closed and released
    /// before the renderer is asked to load the new target.
    ///
    /// # Errors
    /// - [`SandboxError::InvalidTarget`] when the target has no usable origin.
    /// - [`SandboxError::LoadFailed`] when the renderer refuses the session.
    ///
    /// In both cases the gate ends `Closed` and a `LoadFailed` event is emitted.
    pub fn open(
        &mut self,
        target: &str,
        requires_confirmation: bool,
        prompt: &dyn ConfirmationPrompt,
    ) -> Result<OpenOutcome, SandboxError> {
        if requires_confirmation && !prompt.confirm(target) {
            info!(stage = "sandbox", action = "declined");
            return Ok(OpenOutcome::Declined);
        }

        self.close_with(CloseReason::Replaced);

        let policy = match NavigationPolicy::for_target(target, REDIRECT_BOUND) {
            Ok(policy) => policy,
            Err(error) => {
                self.emit(GateEvent::LoadFailed {
                    target: target.to_string(),
                    reason: error.to_string(),
                });
                return Err(error);
            }
        };

        self.emit(GateEvent::Opening {
            target: target.to_string(),
        });

        match self.renderer.load(target, &policy) {
            Ok(handle) => {
                self.session = Some(Session {
                    target: target.to_string(),
                    state: SessionState::Opening,
                    navigation_count: 0,
                    handle,
                    policy,
                    security_headers: Vec::new(),
                });
                Ok(OpenOutcome::Opening)
            }
            Err(error) => {
                let reason = error.to_string();
                self.emit(GateEvent::LoadFailed {
                    target: target.to_string(),
                    reason: reason.clone(),
                });
                Err(SandboxError::LoadFailed(reason))
            }
        }
    }

    /// Applies one renderer event to the live session.
    ///
    /// Events for a closed gate are ignored.
    ///
    /// # Errors
    /// - [`SandboxError::NavigationBlocked`] when a navigation breaks policy.
    /// - [`SandboxError::LoadFailed`] when the renderer reports a failure.
    ///
    /// Both force the gate to `Closed`.
    pub fn on_renderer_event(
        &mut self,
        event: RendererEvent,
    ) -> Result<SessionState, SandboxError> {
        let Some(session) = self.session.as_mut() else {
            debug!(stage = "sandbox", action = "event_ignored");
            return Ok(SessionState::Closed);
        };

        match event {
            RendererEvent::Loaded { headers } => {
                if session.state == SessionState::Opening {
                    session.state = SessionState::Active;
                    session.security_headers = headers
                        .into_iter()
                        .filter(|(name, _)| {
                            SECURITY_HEADER_NAMES.contains(&name.to_ascii_lowercase().as_str())
                        })
                        .collect();
                    let target = session.target.clone();
                    self.emit(GateEvent::Activated { target });
                }
                Ok(self.state())
            }
            RendererEvent::Navigated { url } => {
                match session.policy.check(&url, session.navigation_count) {
                    Ok(()) => {
                        session.navigation_count += 1;
                        Ok(session.state)
                    }
                    Err(reason) => Err(self.force_close_blocked(url, reason.to_string())),
                }
            }
            RendererEvent::NavigationBlocked { url, reason } => {
                Err(self.force_close_blocked(url, reason))
            }
            RendererEvent::LoadFailed { reason } => {
                let target = session.target.clone();
                self.emit(GateEvent::LoadFailed {
                    target,
                    reason: reason.clone(),
                });
                self.close_with(CloseReason::LoadFailed);
                Err(SandboxError::LoadFailed(reason))
            }
        }
    }

    /// Closes the session and releases its resources.
    ///
    /// Returns `false` when the gate was already closed.
    pub fn close(&mut self) -> bool {
        self.close_with(CloseReason::UserClosed)
    }

    /// Force-closes on behalf of a dismissed host view.
    pub fn dismiss(&mut self) -> bool {
        self.close_with(CloseReason::Dismissed)
    }

    fn force_close_blocked(&mut self, url: String, reason: String) -> SandboxError {
        let target = self
            .session
            .as_ref()
            .map(|session| session.target.clone())
            .unwrap_or_default();
        self.emit(GateEvent::NavigationBlocked {
            target,
            url: url.clone(),
            reason: reason.clone(),
        });
        self.close_with(CloseReason::NavigationBlocked);
        SandboxError::NavigationBlocked { url, reason }
    }

    fn close_with(&mut self, reason: CloseReason) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        self.renderer.release(session.handle);
        self.emit(GateEvent::Closed {
            target: session.target,
            reason,
        });
        true
    }

    fn emit(&self, event: GateEvent) {
        self.observer.on_event(&event);
    }
}

impl<R: IsolatedRenderer> Drop for SandboxGate<R> {
    fn drop(&mut self) {
        self.close_with(CloseReason::Dismissed);
    }
}

/// Renderer collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendererError {
    /// Renderer could not create a session.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),
    /// Renderer refused the target.
    #[error("renderer refused target: {0}")]
    Refused(String),
}

/// Sandbox gate errors. Every variant leaves the gate `Closed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// Target cannot be rendered in a sandbox.
    #[error("invalid sandbox target: {0}")]
    InvalidTarget(String),
    /// Renderer failed to load the target.
    #[error("sandbox load failed: {0}")]
    LoadFailed(String),
    /// Navigation broke the session policy.
    #[error("sandbox navigation to {url} blocked: {reason}")]
    NavigationBlocked {
        /// Blocked URL.
        url: String,
        /// Reason.
        reason: String,
    },
}
