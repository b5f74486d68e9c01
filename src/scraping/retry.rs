//! Bounded retry supervision
//!
//! Wraps a fallible async extraction in a fixed attempt budget with a flat
//! delay between attempts. The loop carries an explicit attempt counter;
//! only the final attempt's error surfaces.

use crate::config::RetryConfig;
use crate::scraping::ScrapeError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.delay(),
        }
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping `policy.delay`
/// between attempts. The operation receives the 1-based attempt number so
/// each attempt can set up its own resources from scratch.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ScrapeError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    "extraction attempt failed, retrying: {e}"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn first_success_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let result = with_retry(policy(3), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ScrapeError>(42) }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_on_later_attempt() {
        let result = with_retry(policy(3), |attempt| async move {
            if attempt < 3 {
                Err(ScrapeError::Navigation("flaky".to_string()))
            } else {
                Ok(attempt)
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn exhausted_budget_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let err = with_retry(policy(3), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<(), _>(ScrapeError::Navigation(format!("attempt {attempt}"))) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("attempt 3"));
    }

    #[tokio::test]
    async fn single_attempt_policy_never_retries() {
        let calls = AtomicU32::new(0);
        let result = with_retry(policy(1), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ScrapeError::Session("down".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
