//! dashcheck - acceptance testing for generated Streamlit dashboards.
//!
//! This crate provides:
//! - Static assessment of a project through a declarative check registry
//! - Headless Chrome screenshot capture with browser reuse and blank-output retries
//! - Iterative visual validation with a 100-point rubric and early exit
//! - Cross-environment compatibility scanning
//! - Scenario evaluations gated on the app's health endpoint
//!
//! # Example
//!
//! ```rust,no_run
//! use dashcheck::assess::{AssessOptions, Assessor};
//! use std::path::Path;
//!
//! let report = Assessor::with_defaults()
//!     .assess(Path::new("my-dashboard"), AssessOptions::default())
//!     .unwrap();
//! println!("{}% ({})", report.score_percent, if report.passed { "passed" } else { "failed" });
//! ```

pub mod artifacts;
pub mod assess;
pub mod capture;
pub mod compat;
pub mod config;
pub mod evaluate;
pub mod health;
pub mod retry;
pub mod summary;
pub mod validate;

// Re-export assessment types
pub use assess::{AssessError, AssessOptions, AssessResult, AssessmentReport, Assessor, CheckRegistry, CheckResult};

// Re-export capture types and backends
pub use capture::{
    BrowserBackend, BrowserError, BrowserSession, CaptureOptions, CaptureResult, ChromeBackend, ChromeOptions,
    MockBackend, ScreenshotCapturer,
};

// Re-export validation loop
pub use validate::{IterationResult, ValidateError, ValidationLoop, ValidationOptions};

pub use compat::{CompatReport, scan as scan_compat};
pub use evaluate::{EvaluateError, Evaluation, EvaluationReport};
pub use health::{HealthProbe, ReadinessCheck};
pub use retry::RetryPolicy;
