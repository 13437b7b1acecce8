//! External linter, formatter and type-checker invocation.
//!
//! Subprocesses go through the [`CommandRunner`] trait so tests can script tool
//! output without the binaries installed.

use super::registry::{CheckContext, Verdict};
use super::types::AssessmentReport;
use crate::retry::RetryPolicy;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use thiserror::Error;

/// Attempts for spawning a tool process
pub const SPAWN_ATTEMPTS: u32 = 2;

/// Delay between spawn attempts (milliseconds)
pub const SPAWN_RETRY_DELAY_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Captured output of a finished tool process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs
pub trait CommandRunner {
    /// Whether `program` can be found on PATH
    fn is_available(&self, program: &str) -> bool;

    /// Run `program` with `args` in `cwd` and capture its output
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> ToolResult<ToolOutput>;
}

/// Runs real processes, retrying spawn failures
#[derive(Debug, Clone)]
pub struct SystemRunner {
    policy: RetryPolicy,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::new(SPAWN_ATTEMPTS, Duration::from_millis(SPAWN_RETRY_DELAY_MS)),
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> ToolResult<ToolOutput> {
        log::debug!("Running {} {}", program, args.join(" "));
        let outcome = self
            .policy
            .run(|_| Command::new(program).args(args).current_dir(cwd).output());
        let output = outcome.result.map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;
        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// External tools the assessment knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    RuffLint,
    RuffFormat,
    Ty,
}

impl ToolKind {
    pub fn program(&self) -> &'static str {
        match self {
            ToolKind::RuffLint | ToolKind::RuffFormat => "ruff",
            ToolKind::Ty => "ty",
        }
    }

    /// Suggestion recorded when the program is missing.
    /// The format check shares ruff with linting, so it stays quiet.
    pub fn install_hint(&self) -> Option<&'static str> {
        match self {
            ToolKind::RuffLint => Some("Install ruff: uv tool install ruff"),
            ToolKind::RuffFormat => None,
            ToolKind::Ty => Some("Install ty: uv tool install ty"),
        }
    }
}

/// Run one tool check against `file`.
///
/// Returns `None` when the tool could not be run at all; that is recorded as a
/// suggestion rather than a failed check.
pub fn run_tool_check(
    kind: ToolKind,
    file: &str,
    ctx: &CheckContext<'_>,
    report: &mut AssessmentReport,
) -> Option<Verdict> {
    let result = match kind {
        ToolKind::RuffLint => ruff_lint(file, ctx, report),
        ToolKind::RuffFormat => ruff_format(file, ctx, report),
        ToolKind::Ty => ty_check(file, ctx),
    };
    match result {
        Ok(verdict) => Some(verdict),
        Err(e) => {
            log::warn!("{}", e);
            report.suggest(format!("{} could not be run: {}", kind.program(), e));
            None
        }
    }
}

fn ruff_lint(file: &str, ctx: &CheckContext<'_>, report: &mut AssessmentReport) -> ToolResult<Verdict> {
    let output = ctx
        .tools
        .run("ruff", &["check", file, "--output-format=json"], ctx.root)?;

    // Unparseable output counts as clean
    let issue_count = serde_json::from_str::<Vec<serde_json::Value>>(&output.stdout)
        .map(|issues| issues.len())
        .unwrap_or(0);

    if issue_count == 0 {
        return Ok(Verdict::new(true, "No linting issues"));
    }
    if !ctx.auto_fix {
        return Ok(Verdict::new(
            false,
            format!("Found {} linting issues - run with --fix to auto-correct", issue_count),
        ));
    }

    ctx.tools.run("ruff", &["check", file, "--fix"], ctx.root)?;
    ctx.tools.run("ruff", &["format", file], ctx.root)?;
    report.note_auto_fix(format!("ruff: Fixed {} issues", issue_count));
    Ok(Verdict::new(true, format!("Auto-fixed {} linting issues", issue_count)))
}

fn ruff_format(file: &str, ctx: &CheckContext<'_>, report: &mut AssessmentReport) -> ToolResult<Verdict> {
    let output = ctx.tools.run("ruff", &["format", "--check", file], ctx.root)?;
    if output.success() {
        return Ok(Verdict::new(true, "Code is properly formatted"));
    }
    if !ctx.auto_fix {
        return Ok(Verdict::new(
            false,
            "Code needs formatting - run with --fix or 'ruff format .'",
        ));
    }

    ctx.tools.run("ruff", &["format", file], ctx.root)?;
    report.note_auto_fix("ruff format: Reformatted code");
    Ok(Verdict::new(true, "Auto-formatted code"))
}

fn ty_check(file: &str, ctx: &CheckContext<'_>) -> ToolResult<Verdict> {
    let output = ctx.tools.run("ty", &["check", file], ctx.root)?;
    let has_errors = !output.success() && output.stdout.to_lowercase().contains("error");
    if !has_errors {
        return Ok(Verdict::new(true, "No type errors"));
    }

    let errors: Vec<&str> = output
        .stdout
        .lines()
        .filter(|l| l.to_lowercase().contains("error"))
        .take(3)
        .collect();
    Ok(Verdict::new(
        false,
        format!("Type errors found: {}", errors.join("; ")),
    ))
}

/// Scripted runner for tests
#[derive(Debug, Default)]
pub struct MockRunner {
    available: Vec<String>,
    responses: Vec<(String, ToolOutput)>,
    calls: std::cell::RefCell<Vec<String>>,
}

impl MockRunner {
    /// No tools installed
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Mark `program` as installed
    pub fn with_program(mut self, program: &str) -> Self {
        self.available.push(program.to_string());
        self
    }

    /// Respond to any command line starting with `prefix` (e.g. "ruff check")
    pub fn respond(mut self, prefix: &str, output: ToolOutput) -> Self {
        self.responses.push((prefix.to_string(), output));
        self
    }

    /// Command lines run so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for MockRunner {
    fn is_available(&self, program: &str) -> bool {
        self.available.iter().any(|p| p == program)
    }

    fn run(&self, program: &str, args: &[&str], _cwd: &Path) -> ToolResult<ToolOutput> {
        let line = format!("{} {}", program, args.join(" "));
        self.calls.borrow_mut().push(line.clone());
        if !self.is_available(program) {
            return Err(ToolError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        // Longest matching prefix wins
        let output = self
            .responses
            .iter()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, output)| output.clone())
            .unwrap_or(ToolOutput {
                status: Some(0),
                ..ToolOutput::default()
            });
        Ok(output)
    }
}
