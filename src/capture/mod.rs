//! Headless browser screenshot capture.
//!
//! - [`backend`]: browser/page traits and the scripted mock
//! - [`chrome`]: the headless Chrome implementation
//! - [`session`]: lazily launched, reusable browser lifecycle
//! - [`capturer`]: readiness probing, settle delays and blank-output retries

pub mod backend;
pub mod capturer;
pub mod chrome;
pub mod session;
pub mod types;

pub use backend::{BrowserBackend, MockBackend, MockStep, PageDriver, ScrollTarget};
pub use capturer::ScreenshotCapturer;
pub use chrome::{ChromeBackend, ChromeOptions};
pub use session::{BrowserSession, SessionState};
pub use types::{BrowserError, BrowserResult, CaptureAttempt, CaptureOptions, CaptureResult};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

/// Pixel dimensions of a captured image, if it decodes
pub fn image_dimensions(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(dims) => Some(dims),
        Err(e) => {
            log::debug!("Could not read dimensions of {}: {}", path.display(), e);
            None
        }
    }
}

/// Base64 of the file contents, for inline previews
pub fn encode_base64(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(STANDARD.encode(bytes))
}

/// Leading `chars` characters of the base64 encoding, with an ellipsis when cut
pub fn base64_preview(path: &Path, chars: usize) -> std::io::Result<String> {
    let mut encoded = encode_base64(path)?;
    if encoded.len() > chars {
        encoded.truncate(chars);
        encoded.push_str("...");
    }
    Ok(encoded)
}
