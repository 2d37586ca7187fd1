use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::models::RetryConfig;
use crate::domain::ports::ProviderError;

/// Retry policy for provider calls
///
/// Retries up to `max_retries` attempts in total with a fixed pause between
/// them. Permanent errors (authentication, invalid requests, missing
/// configuration) are returned immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts before giving up
    max_retries: u32,
    /// Fixed pause between attempts in milliseconds
    backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.backoff_ms)
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// A `max_retries` of zero is treated as one attempt.
    pub fn new(max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            max_retries: max_retries.max(1),
            backoff_ms,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Execute an operation with bounded retries
    ///
    /// # Returns
    /// * `Ok(T)` - Operation succeeded
    /// * `Err(ProviderError::RetriesExhausted)` - every attempt failed transiently
    /// * `Err(e)` - a permanent error was returned
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_permanent() => {
                    warn!(attempt, error = %err, "Permanent provider error, not retrying");
                    return Err(err);
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        warn!(attempts = attempt, error = %err, "Retry limit reached");
                        return Err(ProviderError::RetriesExhausted {
                            attempts: attempt,
                            last: err.to_string(),
                        });
                    }
                    debug!(
                        attempt,
                        max_retries = self.max_retries,
                        backoff_ms = self.backoff_ms,
                        error = %err,
                        "Transient provider error, retrying"
                    );
                    sleep(self.backoff()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(5, 1);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(ProviderError::NetworkError("reset".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let policy = RetryPolicy::new(4, 1);
        let calls = Arc::new(AtomicU32::new(0));

        let err = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(ProviderError::ServerError {
                        status: 503,
                        message: "overloaded".into(),
                    })
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(err, ProviderError::RetriesExhausted { attempts: 4, .. }));
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let policy = RetryPolicy::new(16, 1);
        let calls = Arc::new(AtomicU32::new(0));

        let err = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(ProviderError::AuthError("bad key".into()))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ProviderError::AuthError(_)));
    }

    #[test]
    fn defaults_follow_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 16);
        assert_eq!(policy.backoff(), Duration::from_millis(200));
        assert_eq!(RetryPolicy::new(0, 5).max_retries(), 1);
    }
}
