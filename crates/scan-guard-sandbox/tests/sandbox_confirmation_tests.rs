//! Integration tests for the confirmation step before opening.

mod common;

use std::cell::Cell;

use common::{accept, decline, fixture_gate};
use scan_guard_sandbox::{OpenOutcome, RendererEvent, SessionState};

#[test]
fn sandbox_confirmation_tests_decline_leaves_gate_untouched() {
    let (mut gate, log, observer) = fixture_gate();

    let outcome = gate
        .open("http://example.com/danger", true, &decline)
        .expect("declining is not an error");
    assert_eq!(outcome, OpenOutcome::Declined);
    assert_eq!(gate.state(), SessionState::Closed);
    assert!(log.lock().expect("log lock").loaded.is_empty());
    assert!(observer.events().is_empty());
}

#[test]
fn sandbox_confirmation_tests_decline_keeps_existing_session() {
    let (mut gate, log, _observer) = fixture_gate();
    gate.open("https://example.com", false, &accept)
        .expect("open should succeed");
    gate.on_renderer_event(RendererEvent::Loaded { headers: vec![] })
        .expect("load should apply");

    let outcome = gate
        .open("http://example.com/danger", true, &decline)
        .expect("declining is not an error");
    assert_eq!(outcome, OpenOutcome::Declined);
    assert_eq!(gate.state(), SessionState::Active);
    assert_eq!(gate.snapshot().target.as_deref(), Some("https://example.com"));
    assert!(log.lock().expect("log lock").released.is_empty());
}

#[test]
fn sandbox_confirmation_tests_prompt_only_asked_when_required() {
    let (mut gate, _log, _observer) = fixture_gate();
    let asked = Cell::new(0_u32);
    let prompt = |_: &str| {
        asked.set(asked.get() + 1);
        true
    };

    gate.open("https://example.com", false, &prompt)
        .expect("open should succeed");
    assert_eq!(asked.get(), 0);

    let outcome = gate
        .open("http://example.com/danger", true, &prompt)
        .expect("confirmed open should succeed");
    assert_eq!(outcome, OpenOutcome::Opening);
    assert_eq!(asked.get(), 1);
    assert_eq!(gate.state(), SessionState::Opening);
}
