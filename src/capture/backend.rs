//! Browser backend abstraction.
//!
//! - [`BrowserBackend`]: a launchable browser that hands out pages
//! - [`PageDriver`]: the handful of page operations the capture flow needs
//! - [`MockBackend`]: scripted backend for tests, no browser required

use super::types::{BrowserError, BrowserResult};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Scroll destinations used to trigger lazy rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Bottom,
}

/// A single isolated page (tab) in a launched browser
pub trait PageDriver {
    /// Navigate and wait for the network to go idle
    fn goto(&mut self, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Wait until `text` is no longer present in the page body
    fn wait_for_text_gone(&mut self, text: &str, timeout: Duration) -> BrowserResult<()>;

    /// Wait until an element matching `selector` is visible
    fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    fn scroll(&mut self, target: ScrollTarget) -> BrowserResult<()>;

    /// Write a PNG to `path`, returning its size in bytes
    fn screenshot(&mut self, path: &Path, full_page: bool) -> BrowserResult<u64>;

    /// Dispose of the page
    fn close(&mut self) -> BrowserResult<()>;
}

/// A launchable browser
pub trait BrowserBackend {
    /// Start the browser. Calling on a running browser is a no-op.
    fn launch(&mut self) -> BrowserResult<()>;

    /// Open a fresh isolated page
    fn open_page(&mut self) -> BrowserResult<Box<dyn PageDriver + '_>>;

    /// Stop the browser
    fn shutdown(&mut self);

    /// Backend identifier (e.g. "chrome", "mock")
    fn name(&self) -> &str;
}

/// What the next mock page does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockStep {
    /// Render a screenshot of this many bytes
    Render(u64),
    /// Fail navigation outright
    NavigationError(String),
    /// Navigation times out, then the page renders this many bytes
    SlowNavigation(u64),
    /// The app container never appears, then the page renders this many bytes
    NoContainer(u64),
    /// Screenshot itself fails
    ScreenshotError(String),
}

/// Scripted browser for tests.
///
/// Each opened page consumes one [`MockStep`]; when the script runs out the
/// page renders `default_size` bytes.
#[derive(Debug, Clone)]
pub struct MockBackend {
    script: VecDeque<MockStep>,
    default_size: u64,
    fail_launch: bool,
    running: bool,
    /// Number of successful launches
    pub launches: u32,
    pub shutdowns: u32,
    pub pages_opened: u32,
    pub pages_closed: u32,
    /// URLs passed to `goto`, in order
    pub visited: Vec<String>,
    /// Selectors waited on, in order
    pub waited_for: Vec<String>,
}

impl MockBackend {
    pub fn new(default_size: u64) -> Self {
        Self {
            script: VecDeque::new(),
            default_size,
            fail_launch: false,
            running: false,
            launches: 0,
            shutdowns: 0,
            pages_opened: 0,
            pages_closed: 0,
            visited: Vec::new(),
            waited_for: Vec::new(),
        }
    }

    /// Pages render these sizes in order
    pub fn with_sizes(sizes: &[u64]) -> Self {
        let mut backend = Self::new(sizes.last().copied().unwrap_or(0));
        backend.script = sizes.iter().map(|s| MockStep::Render(*s)).collect();
        backend
    }

    pub fn then(mut self, step: MockStep) -> Self {
        self.script.push_back(step);
        self
    }

    /// Make every launch fail
    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl BrowserBackend for MockBackend {
    fn launch(&mut self) -> BrowserResult<()> {
        if self.fail_launch {
            return Err(BrowserError::Launch("mock browser refused to start".into()));
        }
        if !self.running {
            self.running = true;
            self.launches += 1;
        }
        Ok(())
    }

    fn open_page(&mut self) -> BrowserResult<Box<dyn PageDriver + '_>> {
        if !self.running {
            return Err(BrowserError::Closed);
        }
        self.pages_opened += 1;
        let step = self
            .script
            .pop_front()
            .unwrap_or(MockStep::Render(self.default_size));
        Ok(Box::new(MockPage {
            backend: self,
            step,
        }))
    }

    fn shutdown(&mut self) {
        if self.running {
            self.running = false;
            self.shutdowns += 1;
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockPage<'a> {
    backend: &'a mut MockBackend,
    step: MockStep,
}

impl PageDriver for MockPage<'_> {
    fn goto(&mut self, url: &str, timeout: Duration) -> BrowserResult<()> {
        self.backend.visited.push(url.to_string());
        match &self.step {
            MockStep::NavigationError(msg) => Err(BrowserError::Navigation(msg.clone())),
            MockStep::SlowNavigation(_) => Err(BrowserError::timeout(timeout, "page load")),
            _ => Ok(()),
        }
    }

    fn wait_for_text_gone(&mut self, _text: &str, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        self.backend.waited_for.push(selector.to_string());
        match self.step {
            MockStep::NoContainer(_) => Err(BrowserError::timeout(timeout, selector)),
            _ => Ok(()),
        }
    }

    fn scroll(&mut self, _target: ScrollTarget) -> BrowserResult<()> {
        Ok(())
    }

    fn screenshot(&mut self, path: &Path, _full_page: bool) -> BrowserResult<u64> {
        let size = match &self.step {
            MockStep::Render(size) | MockStep::SlowNavigation(size) | MockStep::NoContainer(size) => *size,
            MockStep::ScreenshotError(msg) => return Err(BrowserError::Screenshot(msg.clone())),
            MockStep::NavigationError(msg) => return Err(BrowserError::Navigation(msg.clone())),
        };
        fs::write(path, vec![0u8; size as usize])?;
        Ok(size)
    }

    fn close(&mut self) -> BrowserResult<()> {
        self.backend.pages_closed += 1;
        Ok(())
    }
}
