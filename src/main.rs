use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use dashcheck::artifacts::{self, CaptureMetadata};
use dashcheck::assess::{AssessOptions, Assessor};
use dashcheck::capture::{
    self, BrowserSession, CaptureOptions, CaptureResult, ChromeBackend, ChromeOptions, ScreenshotCapturer,
};
use dashcheck::evaluate::{self, EvaluationReport};
use dashcheck::health::HealthProbe;
use dashcheck::validate::{self, ValidationLoop, ValidationOptions};
use dashcheck::{compat, config, summary};

/// Characters of base64 shown in capture output
const BASE64_PREVIEW_CHARS: usize = 100;

/// dashcheck - acceptance testing for generated Streamlit dashboards
#[derive(Parser, Debug)]
#[command(
    name = "dashcheck",
    about = "Source checks, headless screenshot capture and visual scoring for Streamlit dashboards",
    after_help = "ENVIRONMENT VARIABLES:\n\
        DASHCHECK_APP_URL            Dashboard URL\n\
        DASHCHECK_HEALTH_PATH        Health endpoint path\n\
        DASHCHECK_VIEWPORT           Browser viewport (WxH)\n\
        DASHCHECK_NAV_TIMEOUT        Navigation timeout (seconds)\n\
        DASHCHECK_PROBE_TIMEOUT      Readiness probe timeout (seconds)\n\
        DASHCHECK_SETTLE_MS          Chart render delay (ms)\n\
        DASHCHECK_CAPTURE_ATTEMPTS   Screenshot attempts\n\
        DASHCHECK_BLANK_THRESHOLD    Minimum screenshot size (bytes)\n\
        DASHCHECK_CHROME_PATH        Chrome/Chromium binary\n\
        DASHCHECK_EVALUATIONS_DIR    Evaluation files directory\n\
        RUST_LOG                     Log filter (default: info)"
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the source checks over a project directory
    Assess {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Let ruff fix lint and formatting issues in place
        #[arg(long)]
        fix: bool,

        /// Treat deployment files as optional
        #[arg(long, visible_alias = "localhost")]
        localhost_only: bool,
    },

    /// Score one visual validation iteration
    Validate {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Iteration number (1-based)
        #[arg(default_value = "1")]
        iteration: u32,

        /// Capture a screenshot of the running app
        #[arg(long)]
        auto: bool,

        /// Skip the screenshot even with --auto
        #[arg(long)]
        fast: bool,

        /// Stop when the score reaches this percentage (iteration 2 onwards)
        #[arg(long)]
        early_exit: Option<u32>,

        /// Close the browser when done
        #[arg(long)]
        close_browser: bool,

        /// Dashboard URL
        #[arg(long, env = "DASHCHECK_APP_URL", default_value = config::DEFAULT_APP_URL)]
        url: String,

        /// Total iterations planned
        #[arg(long, default_value_t = config::DEFAULT_MAX_ITERATIONS)]
        max_iterations: u32,
    },

    /// Capture a screenshot of a running app
    Capture {
        /// Dashboard URL
        #[arg(env = "DASHCHECK_APP_URL", default_value = config::DEFAULT_APP_URL)]
        url: String,

        /// Output path
        #[arg(default_value = artifacts::DEFAULT_CAPTURE_FILE)]
        output: PathBuf,

        /// Viewport width
        #[arg(long)]
        width: Option<u32>,

        /// Viewport height
        #[arg(long)]
        height: Option<u32>,

        /// Additional wait before capture (seconds)
        #[arg(long, default_value = "2")]
        wait: u64,

        /// Minimal waits
        #[arg(long)]
        fast: bool,

        /// Capture the viewport only
        #[arg(long)]
        no_full_page: bool,

        /// Capture attempts
        #[arg(long, env = "DASHCHECK_CAPTURE_ATTEMPTS")]
        retries: Option<u32>,
    },

    /// Check Python files for cross-environment compatibility
    Compat {
        /// File or directory to scan
        path: PathBuf,
    },

    /// Run scenario evaluations
    Evaluate {
        /// Evaluation name (file stem); all when omitted
        name: Option<String>,

        /// List available evaluations
        #[arg(long)]
        list: bool,

        /// Print results as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Evaluations directory
        #[arg(long, env = "DASHCHECK_EVALUATIONS_DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

#[derive(Serialize)]
struct CaptureOutput {
    url: String,
    #[serde(flatten)]
    result: CaptureResult,
    base64: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    metadata: Option<PathBuf>,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Machine-readable fatal error on stdout
fn fail(message: impl ToString) -> anyhow::Result<i32> {
    print_json(&ErrorOutput {
        error: message.to_string(),
    })?;
    Ok(1)
}

fn chrome_session(width: u32, height: u32) -> BrowserSession<ChromeBackend> {
    let options = ChromeOptions {
        width,
        height,
        ..ChromeOptions::from_settings(&config::get().capture)
    };
    BrowserSession::new(ChromeBackend::new(options))
}

fn assess(dir: &Path, fix: bool, localhost_only: bool) -> anyhow::Result<i32> {
    let options = AssessOptions {
        auto_fix: fix,
        localhost_only,
    };
    match Assessor::with_defaults().assess(dir, options) {
        Ok(report) => {
            print_json(&report)?;
            summary::print_assessment(&report);
            Ok(if report.passed { 0 } else { 1 })
        }
        Err(e) => fail(e),
    }
}

fn validate_iteration(dir: &Path, url: String, options: ValidationOptions, close_browser: bool) -> anyhow::Result<i32> {
    let settings = &config::get().capture;
    let mut validation = ValidationLoop::new(
        ScreenshotCapturer::new(validate::capture_options(settings, url)),
        chrome_session(settings.viewport_width, settings.viewport_height),
    );

    let result = validation.run_iteration(dir, &options);
    if close_browser {
        validation.close_browser();
    }

    match result {
        Ok(result) => {
            print_json(&result)?;
            summary::print_iteration(&result, options.max_iterations);
            Ok(0)
        }
        Err(e) => fail(e),
    }
}

#[allow(clippy::too_many_arguments)]
fn capture_screenshot(
    url: String,
    output: &Path,
    width: Option<u32>,
    height: Option<u32>,
    wait: u64,
    fast: bool,
    full_page: bool,
    retries: Option<u32>,
) -> anyhow::Result<i32> {
    let settings = &config::get().capture;
    let width = width.unwrap_or(settings.viewport_width);
    let height = height.unwrap_or(settings.viewport_height);
    let extra_wait = if fast { Duration::ZERO } else { Duration::from_secs(wait) };

    let options = CaptureOptions::from_settings(settings, url.clone())
        .viewport(width, height)
        .full_page(full_page)
        .fast(fast)
        .extra_wait(extra_wait)
        .attempts(retries.unwrap_or(settings.attempts));

    log::info!("Screenshot capture: {} -> {}", url, output.display());
    let mut session = chrome_session(width, height);
    let result = ScreenshotCapturer::new(options).capture(&mut session, output);
    session.release();
    summary::print_capture(&result);

    let mut out = CaptureOutput {
        url,
        result,
        base64: None,
        width: None,
        height: None,
        metadata: None,
    };
    if let Some(path) = out.result.path.clone() {
        out.base64 = capture::base64_preview(&path, BASE64_PREVIEW_CHARS).ok();
        if let Some((w, h)) = capture::image_dimensions(&path) {
            out.width = Some(w);
            out.height = Some(h);
        }
        let metadata = CaptureMetadata {
            url: out.url.clone(),
            captured_at: chrono::Local::now().to_rfc3339(),
            width: out.width,
            height: out.height,
            file_size: out.result.file_size,
            retries: out.result.retries,
        };
        match artifacts::write_metadata(&path, &metadata) {
            Ok(written) => out.metadata = Some(written),
            Err(e) => log::warn!("Could not write capture metadata: {}", e),
        }
    }

    print_json(&out)?;
    Ok(if out.result.success { 0 } else { 1 })
}

fn check_compat(path: &Path) -> anyhow::Result<i32> {
    match compat::scan(path) {
        Ok(report) => {
            print_json(&report)?;
            summary::print_compat(&report);
            Ok(if report.passed() { 0 } else { 1 })
        }
        Err(e) => fail(e),
    }
}

fn run_evaluations(name: Option<String>, list: bool, json: bool, dir: Option<PathBuf>) -> anyhow::Result<i32> {
    let dir = dir.unwrap_or_else(|| config::get().evaluations.dir.clone());

    if list {
        let files = match evaluate::list_evaluations(&dir) {
            Ok(files) => files,
            Err(e) => return fail(e),
        };
        println!("Available evaluations:");
        for path in files {
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            match evaluate::load_evaluation(&path) {
                Ok(evaluation) => println!("  - {}: {}", stem, evaluation.description),
                Err(e) => log::warn!("{}", e),
            }
        }
        return Ok(0);
    }

    let files = match name {
        Some(name) => evaluate::find_evaluation(&dir, &name).map(|path| vec![path]),
        None => evaluate::list_evaluations(&dir),
    };
    let files = match files {
        Ok(files) => files,
        Err(e) => return fail(e),
    };

    let probe = HealthProbe::from_config(config::get());
    let mut reports: Vec<EvaluationReport> = Vec::new();
    for path in files {
        let evaluation = match evaluate::load_evaluation(&path) {
            Ok(evaluation) => evaluation,
            Err(e) => return fail(e),
        };
        let report = evaluate::run_evaluation(&evaluation, &probe);
        if !json {
            summary::print_evaluation(&report);
        }
        reports.push(report);
    }

    if json {
        print_json(&reports)?;
    }
    Ok(if reports.iter().any(EvaluationReport::has_failures) { 1 } else { 0 })
}

fn run(args: Args) -> anyhow::Result<i32> {
    match args.command {
        Commands::Assess {
            dir,
            fix,
            localhost_only,
        } => assess(&dir, fix, localhost_only),

        Commands::Validate {
            dir,
            iteration,
            auto,
            fast,
            early_exit,
            close_browser,
            url,
            max_iterations,
        } => {
            let options = ValidationOptions {
                iteration,
                capture: auto,
                fast,
                early_exit,
                max_iterations,
            };
            validate_iteration(&dir, url, options, close_browser)
        }

        Commands::Capture {
            url,
            output,
            width,
            height,
            wait,
            fast,
            no_full_page,
            retries,
        } => capture_screenshot(url, &output, width, height, wait, fast, !no_full_page, retries),

        Commands::Compat { path } => check_compat(&path),

        Commands::Evaluate { name, list, json, dir } => run_evaluations(name, list, json, dir),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            1
        }
    };
    process::exit(code);
}
