//! Bounded retry for startup dependencies such as the database pool.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: Duration::from_millis(2000),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Runs `operation` until it succeeds or the retry budget is spent, returning
/// the last error on exhaustion.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if attempt < config.max_retries => {
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    backoff_ms = config.backoff.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                sleep(config.backoff).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(
                    operation = operation_name,
                    attempts = attempt + 1,
                    error = %e,
                    "Operation failed, giving up"
                );
                return Err(e);
            }
        }
    }
}
