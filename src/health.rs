//! HTTP readiness probe for the running dashboard.

use crate::config::{self, Config};
use crate::retry::RetryPolicy;
use std::time::Duration;
use thiserror::Error;

/// Result type for health probing
pub type HealthResult<T> = Result<T, HealthError>;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Health endpoint returned status {0}")]
    Status(u16),
}

/// Anything that can answer "is the app up right now?"
pub trait ReadinessCheck {
    fn is_ready(&self) -> bool;
}

/// Polls a health endpoint with bounded retries
#[derive(Debug, Clone)]
pub struct HealthProbe {
    url: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl HealthProbe {
    /// Probe `url` using the default timeout and retry policy
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(config::DEFAULT_HEALTH_TIMEOUT),
            policy: RetryPolicy::new(
                config::DEFAULT_HEALTH_ATTEMPTS,
                Duration::from_millis(config::DEFAULT_HEALTH_RETRY_DELAY_MS),
            ),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.app.health_url())
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Single request, no retries
    pub fn check_once(&self) -> HealthResult<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(&self.url).send()?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(HealthError::Status(status.as_u16()))
        }
    }

    /// Probe under the retry policy, returning the last error on exhaustion
    pub fn wait_ready(&self) -> HealthResult<()> {
        log::debug!("Probing {}", self.url);
        let outcome = self.policy.run(|_| self.check_once());
        if outcome.accepted {
            log::info!("App is healthy at {}", self.url);
        }
        outcome.result
    }
}

impl ReadinessCheck for HealthProbe {
    fn is_ready(&self) -> bool {
        match self.wait_ready() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("App not reachable at {}: {}", self.url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_probe(url: String, attempts: u32) -> HealthProbe {
        HealthProbe::new(url).with_policy(RetryPolicy::new(attempts, Duration::ZERO))
    }

    #[test]
    fn test_healthy_endpoint() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/_stcore/health")
            .with_status(200)
            .with_body("ok")
            .create();

        let probe = fast_probe(format!("{}/_stcore/health", server.url()), 3);
        assert!(probe.is_ready());
        mock.assert();
    }

    #[test]
    fn test_unhealthy_endpoint_retries() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/_stcore/health")
            .with_status(503)
            .expect(3)
            .create();

        let probe = fast_probe(format!("{}/_stcore/health", server.url()), 3);
        match probe.wait_ready() {
            Err(HealthError::Status(code)) => assert_eq!(code, 503),
            other => panic!("expected status error, got {:?}", other),
        }
        mock.assert();
    }

    #[test]
    fn test_unreachable_host() {
        let probe = fast_probe("http://127.0.0.1:1/_stcore/health".to_string(), 1)
            .with_timeout(Duration::from_millis(500));
        assert!(!probe.is_ready());
    }
}
