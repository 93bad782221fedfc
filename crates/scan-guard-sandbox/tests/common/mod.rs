//! Shared renderer and observer fakes for sandbox integration tests.

use std::sync::{Arc, Mutex};

use scan_guard_sandbox::{
    GateEvent, IsolatedRenderer, NavigationPolicy, RenderHandle, RendererError, SandboxGate,
    SandboxObserver,
};

/// What the fake renderer saw.
#[derive(Debug, Default)]
pub struct RendererLog {
    pub loaded: Vec<(u64, String)>,
    pub released: Vec<u64>,
    pub policies: Vec<String>,
}

impl RendererLog {
    /// Handles loaded but not yet released.
    #[allow(dead_code)]
    pub fn live_sessions(&self) -> usize {
        self.loaded
            .iter()
            .filter(|(id, _)| !self.released.contains(id))
            .count()
    }
}

/// Renderer that records calls and can be told to fail.
pub struct FakeRenderer {
    pub log: Arc<Mutex<RendererLog>>,
    pub fail_with: Option<RendererError>,
    next_id: u64,
}

impl FakeRenderer {
    pub fn new(log: Arc<Mutex<RendererLog>>) -> Self {
        Self {
            log,
            fail_with: None,
            next_id: 0,
        }
    }
}

impl IsolatedRenderer for FakeRenderer {
    fn load(
        &mut self,
        target: &str,
        policy: &NavigationPolicy,
    ) -> Result<RenderHandle, RendererError> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        self.next_id += 1;
        let mut log = self.log.lock().expect("renderer log lock should work");
        log.loaded.push((self.next_id, target.to_string()));
        log.policies.push(policy.origin());
        Ok(RenderHandle(self.next_id))
    }

    fn release(&mut self, handle: RenderHandle) {
        self.log
            .lock()
            .expect("renderer log lock should work")
            .released
            .push(handle.0);
    }
}

/// Observer capturing every gate event.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<GateEvent>>,
}

impl RecordingObserver {
    #[allow(dead_code)]
    pub fn events(&self) -> Vec<GateEvent> {
        self.events.lock().expect("event lock should work").clone()
    }
}

impl SandboxObserver for RecordingObserver {
    fn on_event(&self, event: &GateEvent) {
        self.events
            .lock()
            .expect("event lock should work")
            .push(event.clone());
    }
}

/// Gate wired to fresh fakes.
pub fn fixture_gate() -> (
    SandboxGate<FakeRenderer>,
    Arc<Mutex<RendererLog>>,
    Arc<RecordingObserver>,
) {
    let log = Arc::new(Mutex::new(RendererLog::default()));
    let observer = Arc::new(RecordingObserver::default());
    let gate = SandboxGate::new(FakeRenderer::new(Arc::clone(&log)), observer.clone());
    (gate, log, observer)
}

/// Prompt that always accepts.
#[allow(dead_code)]
pub fn accept(_target: &str) -> bool {
    true
}

/// Prompt that always declines.
#[allow(dead_code)]
pub fn decline(_target: &str) -> bool {
    false
}
