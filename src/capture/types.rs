//! Types for browser-driven screenshot capture.

use crate::config::{self, CaptureSettings};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Errors raised by a browser backend
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {:.1}s waiting for {what}", .after.as_secs_f32())]
    Timeout { after: Duration, what: String },

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Browser session is closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    pub fn timeout(after: Duration, what: impl Into<String>) -> Self {
        BrowserError::Timeout {
            after,
            what: what.into(),
        }
    }

    /// Timeouts are soft during capture: the flow logs and continues
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}

/// Capture parameters
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Capture the whole scrollable page instead of the viewport
    pub full_page: bool,
    pub nav_timeout: Duration,
    pub probe_timeout: Duration,
    pub fallback_timeout: Duration,
    /// Delay after readiness for charts to finish rendering
    pub settle: Duration,
    /// Caller-requested extra wait on top of `settle`
    pub extra_wait: Duration,
    pub scroll_pause_bottom: Duration,
    pub scroll_pause_top: Duration,
    pub attempts: u32,
    pub retry_delay: Duration,
    /// Files smaller than this are treated as blank renders
    pub blank_threshold: u64,
}

impl CaptureOptions {
    /// Options for `url` from capture settings
    pub fn from_settings(settings: &CaptureSettings, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: settings.viewport_width,
            height: settings.viewport_height,
            full_page: true,
            nav_timeout: settings.nav_timeout(),
            probe_timeout: settings.probe_timeout(),
            fallback_timeout: Duration::from_secs(config::DEFAULT_FALLBACK_PROBE_TIMEOUT),
            settle: Duration::from_millis(settings.settle_ms),
            extra_wait: Duration::ZERO,
            scroll_pause_bottom: Duration::from_millis(200),
            scroll_pause_top: Duration::from_millis(300),
            attempts: settings.attempts,
            retry_delay: Duration::from_millis(config::DEFAULT_CAPTURE_RETRY_DELAY_MS),
            blank_threshold: settings.blank_threshold,
        }
    }

    /// Options for `url` using the global configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_settings(&config::get().capture, url)
    }

    /// Shorter settle delay
    pub fn fast(mut self, fast: bool) -> Self {
        if fast {
            self.settle = self
                .settle
                .min(Duration::from_millis(config::DEFAULT_FAST_SETTLE_MS));
        }
        self
    }

    pub fn full_page(mut self, full_page: bool) -> Self {
        self.full_page = full_page;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn extra_wait(mut self, wait: Duration) -> Self {
        self.extra_wait = wait;
        self
    }

    pub fn blank_threshold(mut self, bytes: u64) -> Self {
        self.blank_threshold = bytes;
        self
    }

    /// Zero every delay; timeouts are kept
    pub fn without_delays(mut self) -> Self {
        self.settle = Duration::ZERO;
        self.extra_wait = Duration::ZERO;
        self.scroll_pause_bottom = Duration::ZERO;
        self.scroll_pause_top = Duration::ZERO;
        self.retry_delay = Duration::ZERO;
        self
    }
}

/// Outcome of one capture call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureResult {
    pub success: bool,
    /// Absolute path of the screenshot, present only on success
    pub path: Option<PathBuf>,
    pub error: Option<String>,
    /// Failed attempts before the final one
    pub retries: u32,
    pub file_size: u64,
}

/// One attempt inside a capture call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureAttempt {
    pub attempt_index: u32,
    pub success: bool,
    pub file_size: u64,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_mode_shortens_settle() {
        let settings = CaptureSettings::defaults();
        let normal = CaptureOptions::from_settings(&settings, "http://localhost:8501");
        assert_eq!(normal.settle, Duration::from_millis(2000));

        let fast = normal.clone().fast(true);
        assert_eq!(fast.settle, Duration::from_millis(1000));
        assert_eq!(normal.clone().fast(false).settle, normal.settle);
    }

    #[test]
    fn test_without_delays_keeps_timeouts() {
        let opts = CaptureOptions::from_settings(&CaptureSettings::defaults(), "http://x").without_delays();
        assert!(opts.settle.is_zero());
        assert!(opts.retry_delay.is_zero());
        assert_eq!(opts.nav_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_error_is_soft() {
        let err = BrowserError::timeout(Duration::from_secs(10), "app container");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timed out after 10.0s waiting for app container");
        assert!(!BrowserError::Navigation("refused".into()).is_timeout());
    }
}
