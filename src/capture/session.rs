//! Shared browser lifecycle.
//!
//! One [`BrowserSession`] owns at most one live browser. It launches lazily on
//! first [`acquire`](BrowserSession::acquire), is reused across captures and
//! is torn down by [`release`](BrowserSession::release) or on drop.

use super::backend::BrowserBackend;
use super::types::BrowserResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Launched,
    Closed,
}

pub struct BrowserSession<B: BrowserBackend> {
    backend: B,
    state: SessionState,
    launches: u32,
}

impl<B: BrowserBackend> BrowserSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::Uninitialized,
            launches: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of times a browser was started by this session
    pub fn launches(&self) -> u32 {
        self.launches
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Running browser, launching it if needed. A released session relaunches.
    pub fn acquire(&mut self) -> BrowserResult<&mut B> {
        if self.state != SessionState::Launched {
            log::info!("Launching browser ({})...", self.backend.name());
            self.backend.launch()?;
            self.state = SessionState::Launched;
            self.launches += 1;
            log::info!("Browser launched (will be reused)");
        }
        Ok(&mut self.backend)
    }

    /// Tear down the browser if one is running
    pub fn release(&mut self) {
        if self.state == SessionState::Launched {
            self.backend.shutdown();
            self.state = SessionState::Closed;
            log::info!("Browser closed");
        }
    }
}

impl<B: BrowserBackend> Drop for BrowserSession<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::backend::MockBackend;

    #[test]
    fn test_lazy_launch_and_reuse() {
        let mut session = BrowserSession::new(MockBackend::new(100));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.backend().launches, 0);

        session.acquire().unwrap();
        session.acquire().unwrap();
        assert_eq!(session.state(), SessionState::Launched);
        assert_eq!(session.launches(), 1);
        assert_eq!(session.backend().launches, 1);
    }

    #[test]
    fn test_release_and_relaunch() {
        let mut session = BrowserSession::new(MockBackend::new(100));
        session.release();
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.acquire().unwrap();
        session.release();
        session.release();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.backend().is_running());
        assert_eq!(session.backend().shutdowns, 1);

        session.acquire().unwrap();
        assert_eq!(session.launches(), 2);
    }

    #[test]
    fn test_launch_failure_leaves_uninitialized() {
        let mut session = BrowserSession::new(MockBackend::new(100).failing_launch());
        assert!(session.acquire().is_err());
        assert_eq!(session.state(), SessionState::Uninitialized);
    }
}
