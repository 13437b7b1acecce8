//! Headless Chrome backend.

use super::backend::{BrowserBackend, PageDriver, ScrollTarget};
use super::types::{BrowserError, BrowserResult};
use crate::config::CaptureSettings;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How long an idle browser survives between captures
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll interval for in-page conditions
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const PAGE_EXTENT_JS: &str = "JSON.stringify([\
    Math.max(document.documentElement.scrollWidth, document.body ? document.body.scrollWidth : 0),\
    Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0)])";

fn js_literal(text: &str) -> BrowserResult<String> {
    serde_json::to_string(text).map_err(|e| BrowserError::Script(e.to_string()))
}

/// True once an element matching `selector` is rendered with a box
fn visibility_script(selector: &str) -> BrowserResult<String> {
    Ok(format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return false; \
         const style = window.getComputedStyle(el); \
         return style.visibility !== 'hidden' && style.display !== 'none' && el.getClientRects().length > 0; }})()",
        js_literal(selector)?
    ))
}

/// Launch parameters
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub width: u32,
    pub height: u32,
    /// Explicit binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
}

impl ChromeOptions {
    pub fn from_settings(settings: &CaptureSettings) -> Self {
        Self {
            width: settings.viewport_width,
            height: settings.viewport_height,
            chrome_path: settings.chrome_path.clone(),
        }
    }
}

/// Chrome/Chromium driven over the DevTools protocol
pub struct ChromeBackend {
    options: ChromeOptions,
    browser: Option<Browser>,
}

impl ChromeBackend {
    pub fn new(options: ChromeOptions) -> Self {
        Self {
            options,
            browser: None,
        }
    }
}

fn describe(e: anyhow::Error) -> String {
    format!("{:#}", e)
}

impl BrowserBackend for ChromeBackend {
    fn launch(&mut self) -> BrowserResult<()> {
        if self.browser.is_some() {
            return Ok(());
        }

        let launch_opts = LaunchOptionsBuilder::default()
            .headless(true)
            .window_size(Some((self.options.width, self.options.height)))
            .path(self.options.chrome_path.clone())
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-setuid-sandbox"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--force-device-scale-factor=1"),
                OsStr::new("--hide-scrollbars"),
            ])
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let browser = Browser::new(launch_opts).map_err(|e| BrowserError::Launch(describe(e)))?;
        self.browser = Some(browser);
        Ok(())
    }

    fn open_page(&mut self) -> BrowserResult<Box<dyn PageDriver + '_>> {
        let browser = self.browser.as_ref().ok_or(BrowserError::Closed)?;
        // Fresh browser context per page
        let context = browser
            .new_context()
            .map_err(|e| BrowserError::Launch(describe(e)))?;
        let tab = context
            .new_tab()
            .map_err(|e| BrowserError::Launch(describe(e)))?;
        Ok(Box::new(ChromePage { tab }))
    }

    fn shutdown(&mut self) {
        // Dropping the handle kills the browser process
        self.browser = None;
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    fn eval(&self, script: &str) -> BrowserResult<Option<serde_json::Value>> {
        self.tab
            .evaluate(script, false)
            .map(|remote| remote.value)
            .map_err(|e| BrowserError::Script(describe(e)))
    }

    /// Evaluate `script` until it yields `true`
    fn poll_until(&self, script: &str, timeout: Duration, what: impl Into<String>) -> BrowserResult<()> {
        let started = Instant::now();
        loop {
            if self.eval(script)?.and_then(|v| v.as_bool()).unwrap_or(false) {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::timeout(timeout, what));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Full scrollable size of the document in CSS pixels
    fn page_extent(&self) -> BrowserResult<(f64, f64)> {
        let value = self.eval(PAGE_EXTENT_JS)?;
        let json = value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Script("page size unavailable".into()))?;
        serde_json::from_str(json).map_err(|e| BrowserError::Script(e.to_string()))
    }
}

impl PageDriver for ChromePage {
    fn goto(&mut self, url: &str, timeout: Duration) -> BrowserResult<()> {
        self.tab.set_default_timeout(timeout);
        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::Navigation(describe(e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|_| BrowserError::timeout(timeout, "page load"))?;
        Ok(())
    }

    fn wait_for_text_gone(&mut self, text: &str, timeout: Duration) -> BrowserResult<()> {
        let script = format!(
            "!(document.body && document.body.innerText.includes({}))",
            js_literal(text)?
        );
        self.poll_until(&script, timeout, format!("'{}' to disappear", text))
    }

    fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        self.poll_until(&visibility_script(selector)?, timeout, selector)
    }

    fn scroll(&mut self, target: ScrollTarget) -> BrowserResult<()> {
        let script = match target {
            ScrollTarget::Top => "window.scrollTo(0, 0)",
            ScrollTarget::Bottom => "window.scrollTo(0, document.body.scrollHeight)",
        };
        self.eval(script).map(|_| ())
    }

    fn screenshot(&mut self, path: &Path, full_page: bool) -> BrowserResult<u64> {
        let clip = if full_page {
            let (width, height) = self.page_extent()?;
            Some(Viewport {
                x: 0.0,
                y: 0.0,
                width,
                height,
                scale: 1.0,
            })
        } else {
            None
        };

        let png = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, clip, true)
            .map_err(|e| BrowserError::Screenshot(describe(e)))?;
        fs::write(path, &png)?;
        Ok(png.len() as u64)
    }

    fn close(&mut self) -> BrowserResult<()> {
        self.tab
            .close(true)
            .map(|_| ())
            .map_err(|e| BrowserError::Script(describe(e)))
    }
}
