//! Human-readable summaries written to stderr.
//!
//! stdout is reserved for JSON, so every summary here goes to stderr. Colors
//! follow the `colored` crate's terminal detection (and `NO_COLOR`).

use crate::assess::AssessmentReport;
use crate::capture::CaptureResult;
use crate::compat::{CompatFinding, CompatReport};
use crate::evaluate::{EvaluationReport, ScenarioStatus};
use crate::validate::{IterationResult, VisualStatus};
use colored::{ColoredString, Colorize};

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn section(title: ColoredString, items: &[String]) {
    if items.is_empty() {
        return;
    }
    eprintln!("\n{}", title);
    for item in items {
        eprintln!("   • {}", item);
    }
}

pub fn print_assessment(report: &AssessmentReport) {
    eprintln!("\n{}", rule());
    eprintln!(
        "{}",
        format!(
            "SELF-ASSESSMENT: {}/{} ({}%)",
            report.score, report.max_score, report.score_percent
        )
        .bold()
    );
    eprintln!("{}", rule());

    section("AUTO-FIXED:".cyan().bold(), &report.auto_fixed);
    section("CRITICAL ISSUES (must fix):".red().bold(), &report.critical_issues);
    section("WARNINGS:".yellow().bold(), &report.warnings);
    section("SUGGESTIONS:".blue().bold(), &report.suggestions);

    if report.passed {
        eprintln!("\n{} {}", "RESULT:".bold(), "PASSED - Ready for deployment".green().bold());
    } else {
        eprintln!("\n{} {}", "RESULT:".bold(), "FAILED - Fix critical issues above".red().bold());
    }
}

pub fn print_iteration(result: &IterationResult, max_iterations: u32) {
    eprintln!("\n{}", "=".repeat(50));
    eprintln!(
        "{}",
        format!(
            "Visual Validation: Iteration {}/{} - Score {}/100",
            result.iteration, max_iterations, result.score_percent
        )
        .bold()
    );
    eprintln!("{}", "=".repeat(50));

    for check in &result.checks {
        let mark = match check.status {
            VisualStatus::Pass => "✓".green(),
            VisualStatus::Warn => "!".yellow(),
            VisualStatus::Fail => "✗".red(),
        };
        eprintln!("  {} {} ({})", mark, check.name, check.points);
    }

    section("Improvements needed:".yellow().bold(), &result.improvements);

    match (&result.screenshot, &result.capture_error) {
        (Some(path), _) => eprintln!("\nScreenshot: {}", path.display()),
        (None, Some(e)) => eprintln!("\n{} {}", "Screenshot failed:".red(), e),
        (None, None) => {}
    }

    if result.early_exit {
        eprintln!("\n{}", "Quality threshold reached, stopping early".green().bold());
    } else if result.continue_to_next {
        eprintln!("\nContinue with iteration {}", result.iteration + 1);
    }
}

pub fn print_capture(result: &CaptureResult) {
    if let Some(path) = &result.path {
        eprintln!(
            "{} {} ({:.1}KB, {} retries)",
            "Captured".green().bold(),
            path.display(),
            result.file_size as f64 / 1024.0,
            result.retries
        );
    } else {
        eprintln!(
            "{} {}",
            "Capture failed:".red().bold(),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn finding_lines(findings: &[CompatFinding]) -> Vec<String> {
    findings
        .iter()
        .map(|f| format!("{}: {}", f.file.display(), f.message))
        .collect()
}

pub fn print_compat(report: &CompatReport) {
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("{}", "COMPATIBILITY CHECK".bold());
    eprintln!("{}", "=".repeat(50));

    section("ISSUES:".red().bold(), &finding_lines(&report.issues));
    section("WARNINGS:".yellow().bold(), &finding_lines(&report.warnings));

    if report.issues.is_empty() && report.warnings.is_empty() {
        eprintln!("\n{} ({} files)", "All checks passed!".green().bold(), report.files_scanned);
    }
}

pub fn print_evaluation(report: &EvaluationReport) {
    eprintln!("\n{}", rule());
    eprintln!("{} {}", "Evaluation:".bold(), report.name);
    eprintln!("Description: {}", report.description);
    eprintln!("{}", rule());

    for scenario in &report.scenarios {
        let status = match scenario.status {
            ScenarioStatus::Passed => "PASS".green().bold(),
            ScenarioStatus::ManualReview => "MANUAL".yellow().bold(),
            ScenarioStatus::Failed => "FAIL".red().bold(),
        };
        eprintln!("\n{} Scenario: {}", status, scenario.id);
        eprintln!("   Query: {}", scenario.query);
        if !scenario.notes.is_empty() {
            eprintln!("   Notes: {}", scenario.notes);
        }
        if scenario.expected_count > 0 {
            eprintln!("   Expected behaviors: {}", scenario.expected_count);
        }
        if scenario.critical_count > 0 {
            eprintln!("   Critical behaviors: {}", scenario.critical_count);
        }
    }

    let summary = &report.summary;
    eprintln!("\n{}", "─".repeat(RULE_WIDTH));
    eprintln!(
        "Summary: {}/{} passed, {} failed, {} need manual review",
        summary.passed.to_string().green(),
        summary.total,
        summary.failed.to_string().red(),
        summary.manual_review.to_string().yellow()
    );
}
