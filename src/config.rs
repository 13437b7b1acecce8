//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for dashcheck, supporting:
//! - Environment variables for all configurable values
//! - Defaults tuned for a local Streamlit dev server
//! - A process-wide cached instance via [`get`]
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DASHCHECK_APP_URL` | URL of the running dashboard | `http://localhost:8501` |
//! | `DASHCHECK_HEALTH_PATH` | Health endpoint path on the app URL | `/_stcore/health` |
//! | `DASHCHECK_VIEWPORT` | Browser viewport as `WxH` | `1920x1080` |
//! | `DASHCHECK_NAV_TIMEOUT` | Navigation timeout (seconds) | `30` |
//! | `DASHCHECK_PROBE_TIMEOUT` | Readiness probe timeout (seconds) | `10` |
//! | `DASHCHECK_SETTLE_MS` | Chart render settle delay (ms) | `2000` |
//! | `DASHCHECK_CAPTURE_ATTEMPTS` | Screenshot attempts per capture | `2` |
//! | `DASHCHECK_BLANK_THRESHOLD` | Minimum screenshot size in bytes | `50000` |
//! | `DASHCHECK_CHROME_PATH` | Explicit Chrome/Chromium binary | auto-detect |
//! | `DASHCHECK_EVALUATIONS_DIR` | Directory of evaluation JSON files | `evaluations` |
//!
//! # Example
//!
//! ```bash
//! # Point at an app on another port and use a smaller viewport
//! export DASHCHECK_APP_URL="http://localhost:8502"
//! export DASHCHECK_VIEWPORT="1280x800"
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default dashboard URL (Streamlit dev server)
pub const DEFAULT_APP_URL: &str = "http://localhost:8501";

/// Default health endpoint path
pub const DEFAULT_HEALTH_PATH: &str = "/_stcore/health";

/// Default viewport width (pixels)
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1920;

/// Default viewport height (pixels)
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1080;

/// Default navigation timeout (seconds)
pub const DEFAULT_NAV_TIMEOUT: u64 = 30;

/// Default readiness probe timeout (seconds)
pub const DEFAULT_PROBE_TIMEOUT: u64 = 10;

/// Timeout for the fallback content selector (seconds)
pub const DEFAULT_FALLBACK_PROBE_TIMEOUT: u64 = 5;

/// Default chart render settle delay (milliseconds)
pub const DEFAULT_SETTLE_MS: u64 = 2000;

/// Settle delay used in fast mode (milliseconds)
pub const DEFAULT_FAST_SETTLE_MS: u64 = 1000;

/// Default screenshot attempts per capture call
pub const DEFAULT_CAPTURE_ATTEMPTS: u32 = 2;

/// Delay between screenshot attempts (milliseconds)
pub const DEFAULT_CAPTURE_RETRY_DELAY_MS: u64 = 1000;

/// Screenshots smaller than this are treated as blank renders
pub const DEFAULT_BLANK_THRESHOLD: u64 = 50_000;

/// Health probe attempts
pub const DEFAULT_HEALTH_ATTEMPTS: u32 = 3;

/// Delay between health probe attempts (milliseconds)
pub const DEFAULT_HEALTH_RETRY_DELAY_MS: u64 = 1000;

/// Per-request health probe timeout (seconds)
pub const DEFAULT_HEALTH_TIMEOUT: u64 = 5;

/// Default number of validation iterations a caller is expected to run
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Default evaluations directory
pub const DEFAULT_EVALUATIONS_DIR: &str = "evaluations";

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the dashboard URL
pub const ENV_APP_URL: &str = "DASHCHECK_APP_URL";

/// Environment variable for the health endpoint path
pub const ENV_HEALTH_PATH: &str = "DASHCHECK_HEALTH_PATH";

/// Environment variable for the viewport size
pub const ENV_VIEWPORT: &str = "DASHCHECK_VIEWPORT";

/// Environment variable for the navigation timeout
pub const ENV_NAV_TIMEOUT: &str = "DASHCHECK_NAV_TIMEOUT";

/// Environment variable for the readiness probe timeout
pub const ENV_PROBE_TIMEOUT: &str = "DASHCHECK_PROBE_TIMEOUT";

/// Environment variable for the settle delay
pub const ENV_SETTLE_MS: &str = "DASHCHECK_SETTLE_MS";

/// Environment variable for capture attempts
pub const ENV_CAPTURE_ATTEMPTS: &str = "DASHCHECK_CAPTURE_ATTEMPTS";

/// Environment variable for the blank-output threshold
pub const ENV_BLANK_THRESHOLD: &str = "DASHCHECK_BLANK_THRESHOLD";

/// Environment variable for an explicit Chrome binary
pub const ENV_CHROME_PATH: &str = "DASHCHECK_CHROME_PATH";

/// Environment variable for the evaluations directory
pub const ENV_EVALUATIONS_DIR: &str = "DASHCHECK_EVALUATIONS_DIR";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for dashcheck
#[derive(Debug, Clone)]
pub struct Config {
    /// Target application settings
    pub app: AppSettings,
    /// Browser and screenshot settings
    pub capture: CaptureSettings,
    /// Evaluation runner settings
    pub evaluations: EvaluationSettings,
}

/// Target application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Base URL of the running dashboard
    pub url: String,
    /// Health endpoint path appended to `url`
    pub health_path: String,
}

/// Browser and screenshot settings
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Navigation timeout (seconds)
    pub nav_timeout: u64,
    /// Readiness probe timeout (seconds)
    pub probe_timeout: u64,
    /// Chart render settle delay (milliseconds)
    pub settle_ms: u64,
    pub attempts: u32,
    /// Minimum acceptable screenshot size (bytes)
    pub blank_threshold: u64,
    /// Explicit browser binary, if any
    pub chrome_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub dir: PathBuf,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            app: AppSettings::from_env(),
            capture: CaptureSettings::from_env(),
            evaluations: EvaluationSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            app: AppSettings::defaults(),
            capture: CaptureSettings::defaults(),
            evaluations: EvaluationSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AppSettings {
    pub fn from_env() -> Self {
        Self {
            url: env::var(ENV_APP_URL).unwrap_or_else(|_| DEFAULT_APP_URL.to_string()),
            health_path: env::var(ENV_HEALTH_PATH)
                .unwrap_or_else(|_| DEFAULT_HEALTH_PATH.to_string()),
        }
    }

    pub fn defaults() -> Self {
        Self {
            url: DEFAULT_APP_URL.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }

    /// Full health endpoint URL
    pub fn health_url(&self) -> String {
        join_url(&self.url, &self.health_path)
    }
}

impl CaptureSettings {
    pub fn from_env() -> Self {
        let (viewport_width, viewport_height) = env::var(ENV_VIEWPORT)
            .ok()
            .and_then(|s| parse_viewport(&s))
            .unwrap_or((DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT));

        Self {
            viewport_width,
            viewport_height,
            nav_timeout: env_parse(ENV_NAV_TIMEOUT).unwrap_or(DEFAULT_NAV_TIMEOUT),
            probe_timeout: env_parse(ENV_PROBE_TIMEOUT).unwrap_or(DEFAULT_PROBE_TIMEOUT),
            settle_ms: env_parse(ENV_SETTLE_MS).unwrap_or(DEFAULT_SETTLE_MS),
            attempts: env_parse(ENV_CAPTURE_ATTEMPTS)
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_CAPTURE_ATTEMPTS),
            blank_threshold: env_parse(ENV_BLANK_THRESHOLD).unwrap_or(DEFAULT_BLANK_THRESHOLD),
            chrome_path: env::var(ENV_CHROME_PATH).ok().map(PathBuf::from),
        }
    }

    pub fn defaults() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            nav_timeout: DEFAULT_NAV_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            settle_ms: DEFAULT_SETTLE_MS,
            attempts: DEFAULT_CAPTURE_ATTEMPTS,
            blank_threshold: DEFAULT_BLANK_THRESHOLD,
            chrome_path: None,
        }
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}

impl EvaluationSettings {
    pub fn from_env() -> Self {
        Self {
            dir: env::var(ENV_EVALUATIONS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_EVALUATIONS_DIR)),
        }
    }

    pub fn defaults() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_EVALUATIONS_DIR),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Parse a viewport string such as `1920x1080` into (width, height)
pub fn parse_viewport(size: &str) -> Option<(u32, u32)> {
    let lower = size.trim().to_lowercase();
    let (w, h) = lower.split_once('x')?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    if w == 0 || h == 0 {
        return None;
    }
    Some((w, h))
}

/// Join a base URL and a path without doubling the slash
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("1920x1080"), Some((1920, 1080)));
        assert_eq!(parse_viewport(" 1280X800 "), Some((1280, 800)));
    }

    #[test]
    fn test_parse_viewport_invalid() {
        assert_eq!(parse_viewport("wide"), None);
        assert_eq!(parse_viewport("1920"), None);
        assert_eq!(parse_viewport("0x600"), None);
    }

    #[test]
    fn test_health_url_join() {
        let app = AppSettings::defaults();
        assert_eq!(app.health_url(), "http://localhost:8501/_stcore/health");
        assert_eq!(join_url("http://h:1/", "/x"), "http://h:1/x");
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.app.url, DEFAULT_APP_URL);
        assert_eq!(config.capture.blank_threshold, 50_000);
        assert_eq!(config.capture.attempts, 2);
        assert_eq!(config.evaluations.dir, PathBuf::from("evaluations"));
    }
}
