//! Retry logic with exponential backoff for registry queries

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Options for retry behavior
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

/// Error shapes worth retrying. Registry queries go over HTTP, so only
/// transport-level failures qualify; a 4xx response never does.
const RETRYABLE_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "dns error",
    "error sending request",
];

/// Executes registry queries with exponential backoff
pub struct RetryManager {
    options: RetryOptions,
}

impl RetryManager {
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    /// Execute the given async operation, retrying transient failures
    pub async fn retry<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.options.initial_delay;
        let max_attempts = self.options.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !Self::is_retryable(&error) || attempt >= max_attempts {
                        return Err(error);
                    }

                    sleep(delay).await;
                    delay = Duration::from_secs_f64(
                        delay.as_secs_f64() * self.options.backoff_multiplier,
                    )
                    .min(self.options.max_delay);
                }
            }
        }

        unreachable!("retry loop returns on the final attempt")
    }

    fn is_retryable<E: std::fmt::Display>(error: &E) -> bool {
        let message = error.to_string().to_lowercase();
        RETRYABLE_PATTERNS
            .iter()
            .any(|pattern| message.contains(pattern))
    }
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new(RetryOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_options() -> RetryOptions {
        RetryOptions {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let manager = RetryManager::new(fast_options());
        let result = manager.retry(|| async { Ok::<_, anyhow::Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let manager = RetryManager::new(fast_options());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(move || {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 2 {
                        Err(anyhow::anyhow!("connection refused"))
                    } else {
                        Ok::<_, anyhow::Error>("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let manager = RetryManager::new(fast_options());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                async move { Err::<i32, _>(anyhow::anyhow!("request timed out")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried() {
        let manager = RetryManager::new(fast_options());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                async move { Err::<i32, _>(anyhow::anyhow!("404 Not Found")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
