//! Declarative check descriptors and the runner that evaluates them.
//!
//! Every heuristic is a [`CheckDescriptor`]: a target file, an optional content
//! precondition, a [`Rule`], a severity and a scope. [`CheckRegistry::run`]
//! evaluates descriptors in registration order and records results into an
//! [`AssessmentReport`]. A descriptor whose target file or precondition is
//! absent is skipped, never failed.

use super::probe::{Probe, SourceText, count_matches};
use super::syntax;
use super::tooling::{self, CommandRunner, ToolKind};
use super::types::{AssessmentReport, CheckResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// How a failing check affects the overall outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
}

/// When a check applies at full severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Always,
    /// Deployment artifact: relaxed to a warning in localhost-only mode
    Deployment,
}

/// A finding reported when its probe holds
#[derive(Debug, Clone, Copy)]
pub struct Finding {
    pub when: Probe,
    /// For `Outnumbers` probes, `{subject}` and `{reference}` are replaced
    /// with the two match counts
    pub message: &'static str,
}

impl Finding {
    pub fn describe(&self, source: &SourceText) -> String {
        match self.when {
            Probe::Outnumbers(subject, reference) => self
                .message
                .replace("{subject}", &count_matches(subject, source.raw()).to_string())
                .replace("{reference}", &count_matches(reference, source.raw()).to_string()),
            _ => self.message.to_string(),
        }
    }
}

/// One tallied construct
#[derive(Debug, Clone, Copy)]
pub struct TallyItem {
    pub probe: Probe,
    pub label: &'static str,
    /// When set, the label is prefixed with this pattern's match count
    pub counted: Option<&'static str>,
}

/// What a check verifies
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Target file must exist
    Exists,
    /// Target must parse as Python
    Syntax,
    /// Fixed outcome, used for checks fully decided by their precondition
    Fixed { passed: bool, message: &'static str },
    /// Probe must hold
    Holds {
        probe: Probe,
        pass: &'static str,
        fail: &'static str,
    },
    /// Probe must not hold; matched findings are the violation
    Forbidden {
        probe: Probe,
        pass: &'static str,
        fail: &'static str,
    },
    /// Every matching finding is an issue; failure lists the first `limit`
    /// joined by `separator` and substituted for `{issues}` in `fail`
    Findings {
        findings: &'static [Finding],
        limit: usize,
        separator: &'static str,
        pass: &'static str,
        fail: &'static str,
    },
    /// Passes when at least `threshold` items hold. `{found}`, `{score}` and
    /// `{total}` are substituted into the messages.
    Tally {
        items: &'static [TallyItem],
        threshold: usize,
        pass: &'static str,
        fail: &'static str,
        /// Failure message when nothing at all was found
        empty: Option<&'static str>,
    },
    /// File must have at least `min` lines
    MinLines { min: usize },
    /// External tool run against the target
    Tool(ToolKind),
}

/// A single declarative check
#[derive(Debug, Clone, Copy)]
pub struct CheckDescriptor {
    /// Stable identifier
    pub id: &'static str,
    /// Display name used in reports
    pub name: &'static str,
    /// Path relative to the project root
    pub target: &'static str,
    /// Content precondition; the check is skipped when it does not hold
    pub precondition: Option<Probe>,
    pub rule: Rule,
    pub severity: Severity,
    pub scope: Scope,
    /// Suggestion recorded whenever the check runs
    pub suggestion: Option<&'static str>,
}

/// Pass/fail decision plus message, before severity is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
}

impl Verdict {
    pub fn new(passed: bool, message: impl Into<String>) -> Self {
        Self {
            passed,
            message: message.into(),
        }
    }
}

impl CheckDescriptor {
    /// Severity after applying localhost-only relaxation
    pub fn effective_severity(&self, localhost_only: bool) -> Severity {
        match (self.scope, localhost_only) {
            (Scope::Deployment, true) => Severity::Warning,
            _ => self.severity,
        }
    }

    /// Evaluate a content rule against literal source.
    ///
    /// Returns `None` when the precondition does not hold or the rule needs
    /// the filesystem or external tools.
    pub fn evaluate(&self, source: &SourceText) -> Option<Verdict> {
        if let Some(pre) = &self.precondition {
            if !pre.holds(source) {
                return None;
            }
        }

        let verdict = match self.rule {
            Rule::Exists | Rule::Tool(_) => return None,
            Rule::Syntax => match syntax::check_python(source.raw()) {
                Ok(()) => Verdict::new(true, "Syntax is valid"),
                Err(issue) => Verdict::new(
                    false,
                    format!("Syntax error at line {}: {}", issue.line, issue.message),
                ),
            },
            Rule::Fixed { passed, message } => Verdict::new(passed, message),
            Rule::Holds { probe, pass, fail } => {
                let ok = probe.holds(source);
                Verdict::new(ok, if ok { pass } else { fail })
            }
            Rule::Forbidden { probe, pass, fail } => {
                let found = probe.holds(source);
                Verdict::new(!found, if found { fail } else { pass })
            }
            Rule::Findings {
                findings,
                limit,
                separator,
                pass,
                fail,
            } => {
                let issues: Vec<String> = findings
                    .iter()
                    .filter(|f| f.when.holds(source))
                    .map(|f| f.describe(source))
                    .take(limit)
                    .collect();
                if issues.is_empty() {
                    Verdict::new(true, pass)
                } else {
                    Verdict::new(false, fail.replace("{issues}", &issues.join(separator)))
                }
            }
            Rule::Tally {
                items,
                threshold,
                pass,
                fail,
                empty,
            } => {
                let found: Vec<String> = items
                    .iter()
                    .filter(|item| item.probe.holds(source))
                    .map(|item| match item.counted {
                        Some(pattern) => {
                            format!("{} {}", count_matches(pattern, source.raw()), item.label)
                        }
                        None => item.label.to_string(),
                    })
                    .collect();
                let ok = found.len() >= threshold;
                let template = match (ok, empty) {
                    (true, _) => pass,
                    (false, Some(empty)) if found.is_empty() => empty,
                    (false, _) => fail,
                };
                let message = template
                    .replace("{found}", &found.join(", "))
                    .replace("{score}", &found.len().to_string())
                    .replace("{total}", &items.len().to_string());
                Verdict::new(ok, message)
            }
            Rule::MinLines { min } => {
                let lines = source.line_count();
                if lines >= min {
                    Verdict::new(true, format!("App has {} lines", lines))
                } else {
                    Verdict::new(
                        false,
                        format!("App only has {} lines - may be incomplete", lines),
                    )
                }
            }
        };
        Some(verdict)
    }
}

/// Inputs shared by every check in one assessment run
pub struct CheckContext<'a> {
    pub root: &'a Path,
    pub localhost_only: bool,
    pub auto_fix: bool,
    pub tools: &'a dyn CommandRunner,
}

/// Per-run cache of target file contents
enum Loaded {
    Missing,
    Unreadable(String),
    Ready(Rc<SourceText>),
}

struct Workspace<'a> {
    root: &'a Path,
    cache: HashMap<&'static str, Rc<SourceText>>,
}

impl<'a> Workspace<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    fn exists(&self, target: &str) -> bool {
        self.root.join(target).exists()
    }

    fn load(&mut self, target: &'static str) -> Loaded {
        if let Some(source) = self.cache.get(target) {
            return Loaded::Ready(Rc::clone(source));
        }
        let path = self.root.join(target);
        if !path.exists() {
            return Loaded::Missing;
        }
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let source = Rc::new(SourceText::new(raw));
                self.cache.insert(target, Rc::clone(&source));
                Loaded::Ready(source)
            }
            Err(e) => Loaded::Unreadable(e.to_string()),
        }
    }
}

/// Ordered collection of check descriptors
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    descriptors: Vec<CheckDescriptor>,
}

impl CheckRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the standard dashboard checks
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for descriptor in super::rules::default_checks() {
            registry.register(descriptor);
        }
        registry
    }

    /// Append a descriptor, replacing any existing one with the same id
    pub fn register(&mut self, descriptor: CheckDescriptor) -> &mut Self {
        match self.descriptors.iter().position(|d| d.id == descriptor.id) {
            Some(i) => self.descriptors[i] = descriptor,
            None => self.descriptors.push(descriptor),
        }
        self
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.descriptors.len();
        self.descriptors.retain(|d| d.id != id);
        self.descriptors.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&CheckDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Evaluate every descriptor in order, recording into `report`
    pub fn run(&self, ctx: &CheckContext<'_>, report: &mut AssessmentReport) {
        let mut workspace = Workspace::new(ctx.root);
        for descriptor in &self.descriptors {
            self.run_one(descriptor, ctx, &mut workspace, report);
        }
    }

    fn run_one(
        &self,
        descriptor: &CheckDescriptor,
        ctx: &CheckContext<'_>,
        workspace: &mut Workspace<'_>,
        report: &mut AssessmentReport,
    ) {
        let critical = descriptor.effective_severity(ctx.localhost_only) == Severity::Critical;

        let verdict = match descriptor.rule {
            Rule::Exists => {
                let exists = workspace.exists(descriptor.target);
                if !exists && ctx.localhost_only && descriptor.scope == Scope::Deployment {
                    report.suggest(format!(
                        "Deployment file not yet generated: {} (will be created on 'deploy to snowflake')",
                        descriptor.target
                    ));
                    return;
                }
                let label = if exists { "Found" } else { "MISSING" };
                Verdict::new(exists, format!("{}: {}", label, descriptor.target))
            }
            Rule::Tool(kind) => {
                if !ctx.tools.is_available(kind.program()) {
                    if let Some(hint) = kind.install_hint() {
                        report.suggest(hint);
                    }
                    return;
                }
                if !workspace.exists(descriptor.target) {
                    return;
                }
                match tooling::run_tool_check(kind, descriptor.target, ctx, report) {
                    Some(verdict) => verdict,
                    None => return,
                }
            }
            _ => match workspace.load(descriptor.target) {
                Loaded::Missing => return,
                Loaded::Unreadable(err) => Verdict::new(
                    false,
                    format!("Could not read {}: {}", descriptor.target, err),
                ),
                Loaded::Ready(source) => match descriptor.evaluate(&source) {
                    Some(verdict) => verdict,
                    None => return,
                },
            },
        };

        log::debug!(
            "{} [{}]: {}",
            descriptor.name,
            if verdict.passed { "PASS" } else { "FAIL" },
            verdict.message
        );
        report.record(CheckResult::new(
            descriptor.name,
            verdict.passed,
            verdict.message,
            critical,
        ));
        if let Some(suggestion) = descriptor.suggestion {
            report.suggest(suggestion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::tooling::MockRunner;
    use tempfile::TempDir;

    const APP_EXISTS: CheckDescriptor = CheckDescriptor {
        id: "file-app",
        name: "File: streamlit_app.py",
        target: "streamlit_app.py",
        precondition: None,
        rule: Rule::Exists,
        severity: Severity::Critical,
        scope: Scope::Always,
        suggestion: None,
    };

    const DEPLOY_FILE: CheckDescriptor = CheckDescriptor {
        id: "file-snowflake",
        name: "File: snowflake.yml",
        target: "snowflake.yml",
        precondition: None,
        rule: Rule::Exists,
        severity: Severity::Critical,
        scope: Scope::Deployment,
        suggestion: None,
    };

    const METRICS: CheckDescriptor = CheckDescriptor {
        id: "metrics",
        name: "Metrics",
        target: "streamlit_app.py",
        precondition: Some(Probe::Contains("import streamlit")),
        rule: Rule::Holds {
            probe: Probe::Contains("st.metric("),
            pass: "has metrics",
            fail: "no metrics",
        },
        severity: Severity::Warning,
        scope: Scope::Always,
        suggestion: None,
    };

    fn run(registry: &CheckRegistry, dir: &Path, localhost_only: bool) -> AssessmentReport {
        let tools = MockRunner::unavailable();
        let ctx = CheckContext {
            root: dir,
            localhost_only,
            auto_fix: false,
            tools: &tools,
        };
        let mut report = AssessmentReport::new(localhost_only);
        registry.run(&ctx, &mut report);
        report
    }

    #[test]
    fn test_missing_target_skips_content_check() {
        let dir = TempDir::new().unwrap();
        let mut registry = CheckRegistry::new();
        registry.register(METRICS);

        let report = run(&registry, dir.path(), false);
        assert_eq!(report.max_score, 0);
        assert!(report.passed);
    }

    #[test]
    fn test_precondition_skips() {
        let source = SourceText::new("print('hello')\n");
        assert!(METRICS.evaluate(&source).is_none());

        let source = SourceText::new("import streamlit as st\nst.metric('Revenue', '$1')\n");
        let verdict = METRICS.evaluate(&source).unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.message, "has metrics");
    }

    #[test]
    fn test_missing_required_file_is_critical() {
        let dir = TempDir::new().unwrap();
        let mut registry = CheckRegistry::new();
        registry.register(APP_EXISTS);

        let report = run(&registry, dir.path(), false);
        assert!(!report.passed);
        assert_eq!(
            report.critical_issues,
            vec!["File: streamlit_app.py: MISSING: streamlit_app.py".to_string()]
        );
    }

    #[test]
    fn test_deployment_file_relaxed_in_localhost_mode() {
        let dir = TempDir::new().unwrap();
        let mut registry = CheckRegistry::new();
        registry.register(DEPLOY_FILE);

        let report = run(&registry, dir.path(), true);
        assert!(report.passed);
        assert_eq!(report.max_score, 0);
        assert_eq!(report.suggestions.len(), 1);
        assert!(report.suggestions[0].contains("snowflake.yml"));

        let report = run(&registry, dir.path(), false);
        assert!(!report.passed);
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = CheckRegistry::new();
        registry.register(APP_EXISTS).register(METRICS).register(APP_EXISTS);
        assert_eq!(registry.len(), 2);
        assert!(registry.remove("metrics"));
        assert!(!registry.remove("metrics"));
        assert!(registry.get("file-app").is_some());
    }

    #[test]
    fn test_tally_messages() {
        const ITEMS: &[TallyItem] = &[
            TallyItem { probe: Probe::Contains("mark_bar"), label: "bar", counted: None },
            TallyItem { probe: Probe::Contains("mark_line"), label: "line", counted: None },
            TallyItem { probe: Probe::Contains("mark_area"), label: "area", counted: None },
        ];
        let check = CheckDescriptor {
            id: "variety",
            name: "Chart variety",
            target: "streamlit_app.py",
            precondition: None,
            rule: Rule::Tally {
                items: ITEMS,
                threshold: 2,
                pass: "Chart types: {found}",
                fail: "Chart types: {found} ({score}/{total})",
                empty: Some("No Altair charts found"),
            },
            severity: Severity::Warning,
            scope: Scope::Always,
            suggestion: None,
        };

        let v = check.evaluate(&SourceText::new("")).unwrap();
        assert_eq!(v.message, "No Altair charts found");
        let v = check.evaluate(&SourceText::new("mark_bar")).unwrap();
        assert_eq!(v.message, "Chart types: bar (1/3)");
        let v = check.evaluate(&SourceText::new("mark_bar mark_area")).unwrap();
        assert!(v.passed);
        assert_eq!(v.message, "Chart types: bar, area");
    }
}
