//! Shared collaborator fakes for app integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scan_guard_app::{ActionDispatcher, ScanView, ShareError, ShareSurface};
use scan_guard_core::{DeclaredType, Payload};
use scan_guard_probe::{ClassificationSlot, ProbeConfig, SyntheticProbeBackend};
use scan_guard_sandbox::{
    ConfirmationPrompt, IsolatedRenderer, NavigationPolicy, RenderHandle, RendererError,
    SandboxGate, TracingObserver,
};

/// Load/release bookkeeping shared with the test body.
#[derive(Debug, Default)]
pub struct RenderCalls {
    pub loaded: Vec<u64>,
    pub released: Vec<u64>,
}

/// Renderer recording every load and release.
pub struct CountingRenderer {
    calls: Arc<Mutex<RenderCalls>>,
    next: u64,
}

impl IsolatedRenderer for CountingRenderer {
    fn load(
        &mut self,
        _target: &str,
        _policy: &NavigationPolicy,
    ) -> Result<RenderHandle, RendererError> {
        self.next += 1;
        self.calls
            .lock()
            .expect("render calls lock should work")
            .loaded
            .push(self.next);
        Ok(RenderHandle(self.next))
    }

    fn release(&mut self, handle: RenderHandle) {
        self.calls
            .lock()
            .expect("render calls lock should work")
            .released
            .push(handle.0);
    }
}

/// Share surface that records shared text or fails.
#[derive(Default)]
pub struct RecordingShare {
    pub fail: bool,
    pub shared: Mutex<Vec<String>>,
}

impl ShareSurface for RecordingShare {
    fn share(&self, text: &str) -> Result<(), ShareError> {
        if self.fail {
            return Err(ShareError::Unavailable);
        }
        self.shared
            .lock()
            .expect("share lock should work")
            .push(text.to_string());
        Ok(())
    }
}

/// Prompt with a fixed answer that counts how often it was asked.
pub struct ScriptedPrompt {
    pub answer: bool,
    pub asked: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedPrompt {
    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl ConfirmationPrompt for ScriptedPrompt {
    fn confirm(&self, _target: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// Fixture knobs.
#[allow(dead_code)]
pub struct FixtureOptions {
    pub probe_latency: Duration,
    pub share_fails: bool,
    pub prompt_answer: bool,
    pub sandbox_enabled: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            probe_latency: Duration::ZERO,
            share_fails: false,
            prompt_answer: true,
            sandbox_enabled: true,
        }
    }
}

/// View plus handles to every fake it was built from.
#[allow(dead_code)]
pub struct Fixture {
    pub view: ScanView<SyntheticProbeBackend, CountingRenderer>,
    pub backend: Arc<SyntheticProbeBackend>,
    pub render_calls: Arc<Mutex<RenderCalls>>,
    pub share: Arc<RecordingShare>,
    pub prompt: Arc<ScriptedPrompt>,
}

/// Builds a view over `raw` with deterministic fakes.
pub fn fixture_view(raw: &str, options: FixtureOptions) -> Fixture {
    let backend = Arc::new(SyntheticProbeBackend::new().with_latency(options.probe_latency));
    let render_calls = Arc::new(Mutex::new(RenderCalls::default()));
    let share = Arc::new(RecordingShare {
        fail: options.share_fails,
        shared: Mutex::new(Vec::new()),
    });
    let prompt = Arc::new(ScriptedPrompt {
        answer: options.prompt_answer,
        asked: AtomicUsize::new(0),
    });

    let renderer = CountingRenderer {
        calls: Arc::clone(&render_calls),
        next: 0,
    };
    let dispatcher = ActionDispatcher::new(
        SandboxGate::new(renderer, Arc::new(TracingObserver)),
        share.clone(),
        prompt.clone(),
        options.sandbox_enabled,
    );
    let slot = ClassificationSlot::new(Arc::clone(&backend), ProbeConfig::default());
    let view = ScanView::new(Payload::new(raw, DeclaredType::Url), slot, dispatcher);

    Fixture {
        view,
        backend,
        render_calls,
        share,
        prompt,
    }
}
