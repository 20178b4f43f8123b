//! Bounded retry with exponential backoff and per-attempt timeouts.
//!
//! Structured sequential retry: one suspension point per attempt, delay
//! computed up front, no callback registration.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff unit; the delay before attempt `n+1` is `base_delay * 2^n`.
    pub base_delay: Duration,
    /// Upper bound for a single attempt.
    pub attempt_timeout: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(30),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Delay before retrying after `failures` failed attempts.
    pub fn delay_after_failures(&self, failures: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(failures))
    }
}

/// Marker for an attempt that hit its time bound; converted into the
/// caller's error type.
#[derive(Debug, Clone, Copy)]
pub struct AttemptTimeout {
    pub limit: Duration,
}

/// Run `operation` up to `config.max_attempts` times.
///
/// The closure receives the 1-based attempt number (for progress
/// messages). Each attempt is bounded by `config.attempt_timeout`; before
/// attempt `n+1` the task sleeps `base_delay * 2^n`.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + From<AttemptTimeout>,
{
    let mut failures = 0u32;

    loop {
        let attempt = failures + 1;
        let outcome = match tokio::time::timeout(config.attempt_timeout, operation(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(E::from(AttemptTimeout {
                limit: config.attempt_timeout,
            })),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts => {
                failures += 1;
                let delay = config.delay_after_failures(failures);
                debug!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, config.max_attempts, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    "{} failed after {} attempts: {}",
                    config.operation_name, attempt, e
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError(String);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl From<AttemptTimeout> for TestError {
        fn from(t: AttemptTimeout) -> Self {
            TestError(format!("timeout after {:?}", t.limit))
        }
    }

    #[test]
    fn test_backoff_doubles_from_two_seconds() {
        let config = RetryConfig::default();
        // First retry waits 2s, second 4s
        assert_eq!(config.delay_after_failures(1), Duration::from_secs(2));
        assert_eq!(config.delay_after_failures(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_immediate_success_runs_once() {
        let config = RetryConfig::new("test");
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> = retry_async(&config, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_eventual_success_after_failures() {
        let config = RetryConfig::new("test").with_base_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> = retry_async(&config, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError("transient".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let config = RetryConfig::new("test")
            .with_base_delay(Duration::from_millis(1))
            .with_max_attempts(3);
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> = retry_async(&config, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(TestError(format!("failure {attempt}"))) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.0, "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempt_timeout_converted() {
        let config = RetryConfig::new("test")
            .with_attempt_timeout(Duration::from_millis(5))
            .with_base_delay(Duration::from_millis(1))
            .with_max_attempts(2);

        let result: Result<u32, TestError> = retry_async(&config, |_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(1)
        })
        .await;

        assert!(result.unwrap_err().0.contains("timeout"));
    }
}
