//! Retry policy for remote file downloads

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::application::errors::IngestionError;

/// Retry configuration for file downloads.
///
/// Only status failures are retried, after a fixed delay. Transport
/// failures end the call on the spot.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

/// Outcome of a single failed attempt
#[derive(Debug)]
pub enum AttemptError {
    /// Network or transport failure; never retried
    Fatal(IngestionError),
    /// Non-success status; retried while attempts remain
    Retryable(IngestionError),
}

/// Run `operation` under `policy`, retrying [`AttemptError::Retryable`]
/// failures after the policy's fixed delay.
pub async fn retry_on_status<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, IngestionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(AttemptError::Fatal(error)) => return Err(error),
            Err(AttemptError::Retryable(error)) => {
                if attempts >= max_attempts {
                    return Err(error);
                }
                debug!(
                    attempt = attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %error,
                    "retrying after status failure"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
