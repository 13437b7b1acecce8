//! Core types for source assessment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Result of one invoked check. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Display name (e.g. "File: streamlit_app.py")
    pub name: String,

    pub status: CheckStatus,

    /// Human-readable detail or remediation hint
    pub message: String,

    /// Whether a failure of this check fails the whole assessment
    pub critical: bool,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, passed: bool, message: impl Into<String>, critical: bool) -> Self {
        Self {
            name: name.into(),
            status: if passed { CheckStatus::Pass } else { CheckStatus::Fail },
            message: message.into(),
            critical,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }

    /// True for a failed check that flips the overall outcome
    pub fn is_critical_failure(&self) -> bool {
        self.critical && !self.passed()
    }
}

/// Aggregated result of running the check registry over a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// False iff any critical check failed
    pub passed: bool,
    pub score: u32,
    pub max_score: u32,
    pub score_percent: u32,
    pub checks: Vec<CheckResult>,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub auto_fixed: Vec<String>,
    pub localhost_only: bool,
}

impl AssessmentReport {
    pub fn new(localhost_only: bool) -> Self {
        Self {
            passed: true,
            score: 0,
            max_score: 0,
            score_percent: 0,
            checks: Vec::new(),
            critical_issues: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            auto_fixed: Vec::new(),
            localhost_only,
        }
    }

    /// Record a check result. Every recorded check is worth one point.
    pub fn record(&mut self, result: CheckResult) {
        self.max_score += 1;
        if result.passed() {
            self.score += 1;
        } else if result.critical {
            self.passed = false;
            self.critical_issues
                .push(format!("{}: {}", result.name, result.message));
        } else {
            self.warnings.push(format!("{}: {}", result.name, result.message));
        }
        self.checks.push(result);
        self.score_percent = score_percent(self.score, self.max_score);
    }

    pub fn suggest(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }

    pub fn note_auto_fix(&mut self, fix: impl Into<String>) {
        self.auto_fixed.push(fix.into());
    }

    /// Look up a recorded check by name
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// `round(100 * score / max_score)`, rounding half to even; 0 when nothing ran
pub fn score_percent(score: u32, max_score: u32) -> u32 {
    if max_score == 0 {
        return 0;
    }
    let ratio = 100.0 * f64::from(score.min(max_score)) / f64::from(max_score);
    ratio.round_ties_even() as u32
}

/// Result type for assessment operations
pub type AssessResult<T> = Result<T, AssessError>;

/// Environment-level failures that prevent producing any report
#[derive(Debug, Error)]
pub enum AssessError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_percent_rounding() {
        assert_eq!(score_percent(0, 0), 0);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 8), 12); // 12.5 rounds to even
        assert_eq!(score_percent(3, 8), 38); // 37.5 rounds to even
        assert_eq!(score_percent(5, 5), 100);
    }

    #[test]
    fn test_record_critical_failure() {
        let mut report = AssessmentReport::new(false);
        report.record(CheckResult::new("Python syntax", false, "Syntax error at line 3: invalid syntax", true));
        report.record(CheckResult::new("App size", true, "App has 80 lines", false));

        assert!(!report.passed);
        assert_eq!(report.score, 1);
        assert_eq!(report.max_score, 2);
        assert_eq!(report.score_percent, 50);
        assert_eq!(
            report.critical_issues,
            vec!["Python syntax: Syntax error at line 3: invalid syntax".to_string()]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_record_warning() {
        let mut report = AssessmentReport::new(true);
        report.record(CheckResult::new("App size", false, "App only has 10 lines - may be incomplete", false));

        assert!(report.passed);
        assert!(report.critical_issues.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.score_percent, 0);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let result = CheckResult::new("x", true, "ok", false);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "PASS");
        assert_eq!(json["critical"], false);
    }
}
