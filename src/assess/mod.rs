//! Static assessment of a generated dashboard project.
//!
//! - [`types`]: check results and the aggregated report
//! - [`probe`] / [`syntax`]: text predicates and Python parsing
//! - [`registry`] / [`rules`]: the declarative check table and its runner
//! - [`tooling`]: ruff and ty integration

pub mod probe;
pub mod registry;
pub mod rules;
pub mod syntax;
pub mod tooling;
pub mod types;

pub use registry::{CheckContext, CheckDescriptor, CheckRegistry, Rule, Scope, Severity};
pub use tooling::{CommandRunner, MockRunner, SystemRunner};
pub use types::{AssessError, AssessResult, AssessmentReport, CheckResult, CheckStatus};

use std::path::Path;

/// Options for one assessment run
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessOptions {
    /// Let ruff rewrite the app in place
    pub auto_fix: bool,
    /// Treat deployment artifacts as optional
    pub localhost_only: bool,
}

/// True when the project has the app and pyproject but no deployment files yet
pub fn detect_localhost_only(dir: &Path) -> bool {
    dir.join("streamlit_app.py").exists()
        && dir.join("pyproject.toml").exists()
        && !dir.join("environment.yml").exists()
}

/// Runs a check registry over project directories
pub struct Assessor {
    registry: CheckRegistry,
    tools: Box<dyn CommandRunner>,
}

impl Assessor {
    pub fn new(registry: CheckRegistry, tools: Box<dyn CommandRunner>) -> Self {
        Self { registry, tools }
    }

    /// Standard checks with real tool processes
    pub fn with_defaults() -> Self {
        Self::new(CheckRegistry::with_defaults(), Box::new(SystemRunner::new()))
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Assess `dir`. Only a missing directory is an error; every check-level
    /// problem ends up in the report.
    pub fn assess(&self, dir: &Path, options: AssessOptions) -> AssessResult<AssessmentReport> {
        if !dir.is_dir() {
            return Err(AssessError::DirectoryNotFound(dir.to_path_buf()));
        }

        let localhost_only = options.localhost_only || {
            let detected = detect_localhost_only(dir);
            if detected {
                log::info!("Auto-detected localhost-only mode (no deployment files yet)");
            }
            detected
        };

        log::info!(
            "Assessing {} ({} checks)",
            dir.display(),
            self.registry.len()
        );
        let ctx = CheckContext {
            root: dir,
            localhost_only,
            auto_fix: options.auto_fix,
            tools: self.tools.as_ref(),
        };
        let mut report = AssessmentReport::new(localhost_only);
        self.registry.run(&ctx, &mut report);

        log::info!(
            "Assessment complete: {}/{} ({}%)",
            report.score,
            report.max_score,
            report.score_percent
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory() {
        let assessor = Assessor::new(CheckRegistry::with_defaults(), Box::new(MockRunner::unavailable()));
        let err = assessor
            .assess(Path::new("/nonexistent/dashboard"), AssessOptions::default())
            .unwrap_err();
        assert!(matches!(err, AssessError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_detect_localhost_only() {
        let dir = TempDir::new().unwrap();
        assert!(!detect_localhost_only(dir.path()));

        fs::write(dir.path().join("streamlit_app.py"), "import streamlit as st\n").unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]\n").unwrap();
        assert!(detect_localhost_only(dir.path()));

        fs::write(dir.path().join("environment.yml"), "channels: []\n").unwrap();
        assert!(!detect_localhost_only(dir.path()));
    }

    #[test]
    fn test_empty_directory_fails_critically() {
        let dir = TempDir::new().unwrap();
        let assessor = Assessor::new(CheckRegistry::with_defaults(), Box::new(MockRunner::unavailable()));
        let report = assessor.assess(dir.path(), AssessOptions::default()).unwrap();

        assert!(!report.passed);
        assert!(!report.localhost_only);
        assert!(report.score <= report.max_score);
        assert!(report.critical_issues.iter().any(|i| i.contains("MISSING: streamlit_app.py")));
    }
}
