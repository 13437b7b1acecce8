//! Bounded retry with a fixed delay between attempts.
//!
//! Shared by screenshot capture, the health probe and tool subprocess
//! invocation. Exhaustion is not an error: the last result is handed back and
//! the caller branches on [`RetryOutcome::accepted`].

use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// Result of running an action under a [`RetryPolicy`]
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Result of the final attempt
    pub result: Result<T, E>,
    /// Number of attempts made (at least 1)
    pub attempts: u32,
    /// Whether the final result was `Ok` and passed the validity predicate
    pub accepted: bool,
}

impl<T, E> RetryOutcome<T, E> {
    /// Failed attempts that preceded the final one
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A policy that runs the action exactly once
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` until it returns `Ok` or attempts are exhausted.
    ///
    /// The action receives the zero-based attempt index.
    pub fn run<T, E, F>(&self, action: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        E: Display,
    {
        self.run_until(action, |_| true)
    }

    /// Run `action` until it returns an `Ok` value accepted by `is_valid`, or
    /// attempts are exhausted.
    pub fn run_until<T, E, F, V>(&self, mut action: F, is_valid: V) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        V: Fn(&T) -> bool,
        E: Display,
    {
        let mut attempts = 0;
        loop {
            let result = action(attempts);
            attempts += 1;

            let accepted = match &result {
                Ok(value) => is_valid(value),
                Err(_) => false,
            };
            if accepted || attempts >= self.max_attempts {
                return RetryOutcome {
                    result,
                    attempts,
                    accepted,
                };
            }

            match &result {
                Err(e) => log::warn!("Attempt {}/{} failed: {}", attempts, self.max_attempts, e),
                Ok(_) => log::warn!(
                    "Attempt {}/{} produced an unusable result",
                    attempts,
                    self.max_attempts
                ),
            }
            if !self.delay.is_zero() {
                log::info!("Retrying in {:.1}s...", self.delay.as_secs_f32());
                thread::sleep(self.delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let outcome = policy.run(|_| Ok::<_, String>(7));
        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.retries(), 0);
        assert_eq!(outcome.result.unwrap(), 7);
    }

    #[test]
    fn test_retries_until_valid() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let outcome = policy.run_until(|i| Ok::<_, String>(i * 10), |v| *v >= 20);
        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.retries(), 2);
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let outcome = policy.run(|i| {
            calls += 1;
            Err::<(), _>(format!("boom {}", i))
        });
        assert!(!outcome.accepted);
        assert_eq!(calls, 3);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.retries(), 2);
        assert_eq!(outcome.result.unwrap_err(), "boom 2");
    }

    #[test]
    fn test_invalid_on_every_attempt_keeps_last_value() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let outcome = policy.run_until(|i| Ok::<_, String>(i), |_| false);
        assert!(!outcome.accepted);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.result.unwrap(), 1);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(RetryPolicy::once().max_attempts(), 1);
    }
}
