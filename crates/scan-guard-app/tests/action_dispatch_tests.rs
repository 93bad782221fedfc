//! Integration tests for Share and Open dispatch.

mod common;

use common::{FixtureOptions, fixture_view};
use scan_guard_app::{AppError, ShareOutcome};
use scan_guard_core::RiskLevel;
use scan_guard_sandbox::{OpenOutcome, RendererEvent, SessionState};

#[tokio::test]
async fn action_dispatch_tests_share_forwards_raw_payload() {
    let mut fixture = fixture_view("https://example.com/menu", FixtureOptions::default());
    fixture.view.classify().await.expect("classification should complete");

    assert_eq!(fixture.view.share(), ShareOutcome::Shared);
    assert_eq!(
        *fixture.share.shared.lock().expect("share lock should work"),
        vec!["https://example.com/menu".to_string()]
    );
}

#[tokio::test]
async fn action_dispatch_tests_share_failure_changes_nothing() {
    let mut fixture = fixture_view(
        "https://example.com/menu",
        FixtureOptions {
            share_fails: true,
            ..FixtureOptions::default()
        },
    );
    fixture.view.classify().await.expect("classification should complete");
    let card_before = fixture.view.card();

    assert!(matches!(fixture.view.share(), ShareOutcome::Failed(_)));
    assert_eq!(fixture.view.card(), card_before);
    assert_eq!(fixture.view.dispatcher().gate().state(), SessionState::Closed);
}

#[tokio::test]
async fn action_dispatch_tests_safe_open_skips_prompt() {
    let mut fixture = fixture_view("https://example.com/menu", FixtureOptions::default());
    let verdict = fixture.view.classify().await.expect("classification should complete");
    assert_eq!(verdict.risk_level, RiskLevel::Safe);

    assert_eq!(fixture.view.open().expect("open should start"), OpenOutcome::Opening);
    assert_eq!(fixture.prompt.times_asked(), 0);
    assert_eq!(
        fixture
            .view
            .renderer_event(RendererEvent::Loaded { headers: Vec::new() })
            .expect("load should succeed"),
        SessionState::Active
    );
}

#[tokio::test]
async fn action_dispatch_tests_dangerous_open_declined_leaves_gate_closed() {
    let mut fixture = fixture_view(
        "https://danger.example.com",
        FixtureOptions {
            prompt_answer: false,
            ..FixtureOptions::default()
        },
    );
    let verdict = fixture.view.classify().await.expect("classification should complete");
    assert_eq!(verdict.risk_level, RiskLevel::Dangerous);

    assert_eq!(fixture.view.open().expect("open should resolve"), OpenOutcome::Declined);
    assert_eq!(fixture.prompt.times_asked(), 1);
    assert_eq!(fixture.view.dispatcher().gate().state(), SessionState::Closed);
    assert!(
        fixture
            .render_calls
            .lock()
            .expect("render calls lock should work")
            .loaded
            .is_empty()
    );
}

#[tokio::test]
async fn action_dispatch_tests_dangerous_open_confirmed_loads_once() {
    let mut fixture = fixture_view("https://danger.example.com", FixtureOptions::default());
    fixture.view.classify().await.expect("classification should complete");

    assert_eq!(fixture.view.open().expect("open should start"), OpenOutcome::Opening);
    assert_eq!(fixture.prompt.times_asked(), 1);
    assert_eq!(
        fixture
            .render_calls
            .lock()
            .expect("render calls lock should work")
            .loaded
            .len(),
        1
    );
}

#[tokio::test]
async fn action_dispatch_tests_open_before_verdict_is_rejected() {
    let mut fixture = fixture_view("https://example.com", FixtureOptions::default());

    assert!(matches!(fixture.view.open(), Err(AppError::VerdictPending)));
    assert_eq!(fixture.view.dispatcher().gate().state(), SessionState::Closed);
}

#[tokio::test]
async fn action_dispatch_tests_kill_switch_disables_open() {
    let mut fixture = fixture_view(
        "https://example.com",
        FixtureOptions {
            sandbox_enabled: false,
            ..FixtureOptions::default()
        },
    );
    fixture.view.classify().await.expect("classification should complete");

    assert_eq!(fixture.view.open().expect("open should resolve"), OpenOutcome::Disabled);
    assert!(
        fixture
            .render_calls
            .lock()
            .expect("render calls lock should work")
            .loaded
            .is_empty()
    );
}

#[tokio::test]
async fn action_dispatch_tests_cross_origin_navigation_closes_preview() {
    let mut fixture = fixture_view("https://example.com/menu", FixtureOptions::default());
    fixture.view.classify().await.expect("classification should complete");
    fixture.view.open().expect("open should start");

    let blocked = fixture.view.renderer_event(RendererEvent::Navigated {
        url: "https://elsewhere.example.org/".to_string(),
    });

    assert!(matches!(blocked, Err(AppError::Sandbox(_))));
    assert_eq!(fixture.view.dispatcher().gate().state(), SessionState::Closed);
    assert_eq!(
        fixture
            .render_calls
            .lock()
            .expect("render calls lock should work")
            .released,
        vec![1]
    );
}
