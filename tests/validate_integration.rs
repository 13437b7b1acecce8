//! Integration tests for capture and the validation loop using the scripted
//! `MockBackend` browser.

use dashcheck::artifacts;
use dashcheck::capture::{BrowserSession, CaptureOptions, MockBackend, MockStep, ScreenshotCapturer, SessionState};
use dashcheck::config::CaptureSettings;
use dashcheck::validate::{ValidationLoop, ValidationOptions, VisualStatus};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const URL: &str = "http://localhost:8501";

fn capturer(attempts: u32) -> ScreenshotCapturer {
    ScreenshotCapturer::new(
        CaptureOptions::from_settings(&CaptureSettings::defaults(), URL)
            .attempts(attempts)
            .without_delays(),
    )
}

/// Copy of the fixture dashboard in a temp directory
fn fixture_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dashboard");
    for name in ["streamlit_app.py", "pyproject.toml"] {
        fs::copy(src.join(name), dir.path().join(name)).unwrap();
    }
    dir
}

#[test]
fn test_blank_blank_then_rendered() {
    let dir = TempDir::new().unwrap();
    let mut session = BrowserSession::new(MockBackend::with_sizes(&[10_000, 10_000, 120_000]));

    let result = capturer(3).capture(&mut session, &dir.path().join("shots/app.png"));

    assert!(result.success);
    assert_eq!(result.retries, 2);
    assert_eq!(result.file_size, 120_000);
    assert_eq!(session.backend().visited, vec![URL.to_string(); 3]);
    assert_eq!(fs::metadata(result.path.unwrap()).unwrap().len(), 120_000);
}

#[test]
fn test_every_attempt_blank() {
    let dir = TempDir::new().unwrap();
    let mut session = BrowserSession::new(MockBackend::new(4_096));

    let result = capturer(3).capture(&mut session, &dir.path().join("app.png"));

    assert!(!result.success);
    assert!(result.path.is_none());
    assert_eq!(result.retries, 2);
    assert_eq!(session.backend().pages_opened, 3);
    assert!(result.retries < 3);
}

#[test]
fn test_screenshot_error_recovers() {
    let dir = TempDir::new().unwrap();
    let backend = MockBackend::new(75_000).then(MockStep::ScreenshotError("target crashed".into()));
    let mut session = BrowserSession::new(backend);

    let result = capturer(2).capture(&mut session, &dir.path().join("app.png"));
    assert!(result.success);
    assert_eq!(result.retries, 1);
    assert_eq!(session.backend().pages_closed, 2);
}

#[test]
fn test_session_reused_across_iterations() {
    let project = fixture_project();
    let mut validation = ValidationLoop::new(capturer(2), BrowserSession::new(MockBackend::new(90_000)));

    for iteration in 1..=2 {
        let options = ValidationOptions {
            iteration,
            capture: true,
            ..ValidationOptions::default()
        };
        let result = validation.run_iteration(project.path(), &options).unwrap();
        assert_eq!(
            result.screenshot.as_deref().and_then(artifacts::parse_iteration),
            Some(iteration)
        );
    }
    assert_eq!(validation.session().launches(), 1);
    assert_eq!(validation.session().state(), SessionState::Launched);

    let shots = artifacts::list_iteration_screenshots(project.path()).unwrap();
    let numbers: Vec<u32> = shots.iter().map(|(n, _)| *n).collect();
    assert_eq!(numbers, vec![1, 2]);

    validation.close_browser();
    assert_eq!(validation.session().state(), SessionState::Closed);
    assert_eq!(validation.session().backend().shutdowns, 1);

    let options = ValidationOptions {
        iteration: 3,
        capture: true,
        ..ValidationOptions::default()
    };
    validation.run_iteration(project.path(), &options).unwrap();
    assert_eq!(validation.session().launches(), 2);
}

#[test]
fn test_fixture_scores_full_rubric_and_exits_early() {
    let project = fixture_project();
    let mut validation = ValidationLoop::new(capturer(1), BrowserSession::new(MockBackend::new(90_000)));

    let options = ValidationOptions {
        iteration: 2,
        early_exit: Some(90),
        ..ValidationOptions::default()
    };
    let result = validation.run_iteration(project.path(), &options).unwrap();

    assert_eq!(result.score, 100);
    assert_eq!(result.score_percent, 100);
    assert!(result.improvements.is_empty());
    assert!(result.checks.iter().all(|c| c.status == VisualStatus::Pass));
    assert!(result.early_exit);
    assert!(!result.continue_to_next);
    assert!(result.screenshot.is_none());
    assert_eq!(validation.session().launches(), 0);
}

#[test]
fn test_iteration_one_never_exits_early() {
    let project = fixture_project();
    let mut validation = ValidationLoop::new(capturer(1), BrowserSession::new(MockBackend::new(90_000)));

    let options = ValidationOptions {
        iteration: 1,
        early_exit: Some(50),
        ..ValidationOptions::default()
    };
    let result = validation.run_iteration(project.path(), &options).unwrap();
    assert!(!result.early_exit);
    assert!(result.continue_to_next);
}

#[test]
fn test_capture_failure_is_reported_not_fatal() {
    let project = fixture_project();
    let backend = MockBackend::new(90_000).failing_launch();
    let mut validation = ValidationLoop::new(capturer(2), BrowserSession::new(backend));

    let options = ValidationOptions {
        capture: true,
        ..ValidationOptions::default()
    };
    let result = validation.run_iteration(project.path(), &options).unwrap();
    assert!(result.screenshot.is_none());
    assert!(result.capture_error.is_some());
    assert_eq!(result.score, 100);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["checks"][0]["status"], "PASS");
    assert!(json["capture_error"].is_string());
}
