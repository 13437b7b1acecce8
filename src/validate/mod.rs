//! Iterative visual validation.
//!
//! One call to [`ValidationLoop::run_iteration`] is one iteration: analyze the
//! app source, optionally capture a screenshot, score the rubric and decide
//! whether the caller should run another round. The loop keeps no state
//! between iterations apart from the shared browser session.

pub mod score;
pub mod structure;

pub use score::{ScoreBreakdown, VisualCheckItem, VisualStatus, calculate_score, should_exit_early};
pub use structure::{Element, ElementPresence, alignment_issues};

use crate::artifacts;
use crate::capture::{BrowserBackend, BrowserSession, CaptureOptions, ScreenshotCapturer};
use crate::config::{self, CaptureSettings};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ValidateResult<T> = Result<T, ValidateError>;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
}

/// Per-iteration options
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub iteration: u32,
    /// Capture a screenshot this iteration
    pub capture: bool,
    /// Skip the screenshot regardless of `capture`
    pub fast: bool,
    pub early_exit: Option<u32>,
    pub max_iterations: u32,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            iteration: 1,
            capture: false,
            fast: false,
            early_exit: None,
            max_iterations: config::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Outcome of one validation iteration
#[derive(Debug, Clone, Serialize)]
pub struct IterationResult {
    pub iteration: u32,
    pub timestamp: String,
    pub score: u32,
    pub score_percent: u32,
    pub checks: Vec<VisualCheckItem>,
    pub improvements: Vec<String>,
    pub screenshot: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_error: Option<String>,
    pub early_exit: bool,
    pub continue_to_next: bool,
}

/// Read the app and analyze it. A missing or unreadable app scores as empty.
pub fn analyze_project(dir: &Path) -> (ElementPresence, Vec<String>) {
    let app = dir.join("streamlit_app.py");
    match fs::read_to_string(&app) {
        Ok(source) => (ElementPresence::analyze(&source), alignment_issues(&source)),
        Err(e) => {
            log::warn!("Cannot read {}: {}", app.display(), e);
            (ElementPresence::empty(), Vec::new())
        }
    }
}

/// Capture options for iteration screenshots. The full settle delay is kept
/// so async charts finish rendering; `fast` only skips the capture.
pub fn capture_options(settings: &CaptureSettings, url: impl Into<String>) -> CaptureOptions {
    CaptureOptions::from_settings(settings, url)
}

pub struct ValidationLoop<B: BrowserBackend> {
    capturer: ScreenshotCapturer,
    session: BrowserSession<B>,
}

impl<B: BrowserBackend> ValidationLoop<B> {
    pub fn new(capturer: ScreenshotCapturer, session: BrowserSession<B>) -> Self {
        Self { capturer, session }
    }

    pub fn session(&self) -> &BrowserSession<B> {
        &self.session
    }

    /// Tear down the shared browser
    pub fn close_browser(&mut self) {
        self.session.release();
    }

    pub fn run_iteration(&mut self, dir: &Path, options: &ValidationOptions) -> ValidateResult<IterationResult> {
        if !dir.is_dir() {
            return Err(ValidateError::DirectoryNotFound(dir.to_path_buf()));
        }

        log::info!("Visual validation - iteration {}", options.iteration);
        log::info!("Analyzing code structure...");
        let (elements, issues) = analyze_project(dir);
        let breakdown = calculate_score(&elements, &issues);

        let (screenshot, capture_error) = if options.capture && !options.fast {
            log::info!("Capturing screenshot for iteration {}...", options.iteration);
            let output = artifacts::iteration_screenshot(dir, options.iteration);
            let result = self.capturer.capture(&mut self.session, &output);
            (result.path, result.error)
        } else {
            (None, None)
        };

        let early_exit = should_exit_early(options.iteration, breakdown.score_percent, options.early_exit);
        if early_exit {
            log::info!(
                "Early exit: score {}% >= {}% threshold",
                breakdown.score_percent,
                options.early_exit.unwrap_or_default()
            );
        }

        Ok(IterationResult {
            iteration: options.iteration,
            timestamp: chrono::Local::now().to_rfc3339(),
            score: breakdown.score,
            score_percent: breakdown.score_percent,
            checks: breakdown.items,
            improvements: breakdown.improvements,
            screenshot,
            capture_error,
            early_exit,
            continue_to_next: !early_exit && options.iteration < options.max_iterations,
        })
    }
}
