//! Screenshot capture with readiness probing and blank-output retries.

use super::backend::{BrowserBackend, PageDriver, ScrollTarget};
use super::session::BrowserSession;
use super::types::{BrowserResult, CaptureAttempt, CaptureOptions, CaptureResult};
use crate::retry::RetryPolicy;
use std::fs;
use std::path::Path;
use std::thread;

/// Text Streamlit shows while a script run is in progress
pub const LOADING_TEXT: &str = "Running...";

/// Main app container
pub const APP_CONTAINER_SELECTOR: &str = r#"[data-testid="stAppViewContainer"]"#;

/// Fallback content selector for older layouts
pub const FALLBACK_SELECTOR: &str = ".main";

/// Captures screenshots of a running app through a shared browser session
#[derive(Debug, Clone)]
pub struct ScreenshotCapturer {
    options: CaptureOptions,
}

/// Downgrade a timeout to a warning; other errors pass through
fn soft(result: BrowserResult<()>, step: &str) -> BrowserResult<()> {
    match result {
        Err(e) if e.is_timeout() => {
            log::warn!("{}: {} (continuing)", step, e);
            Ok(())
        }
        other => other,
    }
}

fn pause(duration: std::time::Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

fn kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

impl ScreenshotCapturer {
    pub fn new(options: CaptureOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Capture `options.url` into `output`.
    ///
    /// Retries when an attempt errors or writes a file below the blank
    /// threshold. Never panics or returns an error: failures are reported in
    /// the [`CaptureResult`].
    pub fn capture<B: BrowserBackend>(&self, session: &mut BrowserSession<B>, output: &Path) -> CaptureResult {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                return CaptureResult {
                    success: false,
                    path: None,
                    error: Some(format!("Cannot create {}: {}", parent.display(), e)),
                    retries: 0,
                    file_size: 0,
                };
            }
        }

        let policy = RetryPolicy::new(self.options.attempts, self.options.retry_delay);
        let outcome = policy.run_until(
            |index| self.attempt(session, output, index),
            |attempt: &CaptureAttempt| attempt.success,
        );
        let retries = outcome.retries();

        match outcome.result {
            Ok(attempt) if outcome.accepted => {
                let path = fs::canonicalize(output).unwrap_or_else(|_| output.to_path_buf());
                log::info!("Screenshot captured: {} ({:.1}KB)", path.display(), kb(attempt.file_size));
                CaptureResult {
                    success: true,
                    path: Some(path),
                    error: None,
                    retries,
                    file_size: attempt.file_size,
                }
            }
            Ok(attempt) => {
                log::error!("All {} attempts produced blank screenshots", outcome.attempts);
                CaptureResult {
                    success: false,
                    path: None,
                    error: attempt.error,
                    retries,
                    file_size: attempt.file_size,
                }
            }
            Err(e) => {
                log::error!("Capture failed after {} attempts: {}", outcome.attempts, e);
                CaptureResult {
                    success: false,
                    path: None,
                    error: Some(e.to_string()),
                    retries,
                    file_size: 0,
                }
            }
        }
    }

    fn attempt<B: BrowserBackend>(
        &self,
        session: &mut BrowserSession<B>,
        output: &Path,
        index: u32,
    ) -> BrowserResult<CaptureAttempt> {
        log::info!(
            "Attempt {}/{}: navigating to {}",
            index + 1,
            self.options.attempts,
            self.options.url
        );
        let backend = session.acquire()?;
        let mut page = backend.open_page()?;
        let rendered = self.render(page.as_mut(), output);
        if let Err(e) = page.close() {
            log::debug!("Page close failed: {}", e);
        }
        let file_size = rendered?;

        let success = file_size >= self.options.blank_threshold;
        let error = if success {
            None
        } else {
            log::warn!("Screenshot is only {:.1}KB - may be blank", kb(file_size));
            Some(format!(
                "Screenshot is only {:.1}KB (threshold {:.1}KB) - page may be blank",
                kb(file_size),
                kb(self.options.blank_threshold)
            ))
        };
        Ok(CaptureAttempt {
            attempt_index: index,
            success,
            file_size,
            error,
        })
    }

    fn render(&self, page: &mut dyn PageDriver, output: &Path) -> BrowserResult<u64> {
        let opts = &self.options;

        soft(page.goto(&opts.url, opts.nav_timeout), "Navigation")?;
        soft(
            page.wait_for_text_gone(LOADING_TEXT, opts.probe_timeout),
            "Script run indicator",
        )?;

        match page.wait_for_visible(APP_CONTAINER_SELECTOR, opts.probe_timeout) {
            Err(e) if e.is_timeout() => {
                log::debug!("App container not found, trying {}", FALLBACK_SELECTOR);
                soft(
                    page.wait_for_visible(FALLBACK_SELECTOR, opts.fallback_timeout),
                    "Content selector",
                )?;
            }
            other => other?,
        }

        let settle = opts.settle + opts.extra_wait;
        if !settle.is_zero() {
            log::info!("Waiting {:.1}s for charts to render...", settle.as_secs_f32());
        }
        pause(settle);

        page.scroll(ScrollTarget::Bottom)?;
        pause(opts.scroll_pause_bottom);
        page.scroll(ScrollTarget::Top)?;
        pause(opts.scroll_pause_top);

        page.screenshot(output, opts.full_page)
    }
}
