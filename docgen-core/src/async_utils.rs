//! Async utilities and patterns
//!
//! Provides retry logic for callers, deadlines, and bounded fan-out that stays
//! on the calling task so that cancelling the caller cancels every branch.

use crate::error::{DocgenError, DocgenResult, ErrorContext};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: usize,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier (exponential backoff)
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Retry an async operation with exponential backoff
///
/// Only errors reporting [`DocgenError::is_recoverable`] are retried. A delay
/// suggested by the error (for example a rate limit reset) is honoured when it
/// is longer than the backoff delay, capped at `max_delay_ms`.
pub async fn retry_async<F, T>(
    operation: F,
    config: RetryConfig,
    operation_name: &str,
) -> DocgenResult<T>
where
    F: Fn() -> BoxFuture<'static, DocgenResult<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay_ms;

    loop {
        attempt += 1;

        debug!(
            operation = operation_name,
            attempt = attempt,
            max_attempts = config.max_attempts,
            "Attempting operation"
        );

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                if !error.is_recoverable() || attempt >= config.max_attempts {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        error = %error,
                        "Operation failed"
                    );
                    return Err(error);
                }

                let suggested = error.retry_delay_ms().unwrap_or(0);
                let base_delay = delay.max(suggested).min(config.max_delay_ms);
                let actual_delay = if config.jitter {
                    let jitter_factor = 0.1;
                    let jitter = (fastrand::f64() - 0.5) * 2.0 * jitter_factor;
                    ((base_delay as f64) * (1.0 + jitter)) as u64
                } else {
                    base_delay
                };

                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %error,
                    delay_ms = actual_delay,
                    "Operation failed, retrying"
                );

                sleep(Duration::from_millis(actual_delay)).await;

                delay = ((delay as f64) * config.backoff_multiplier) as u64;
                delay = delay.min(config.max_delay_ms);
            }
        }
    }
}

/// Timeout wrapper for async operations
///
/// When the deadline passes the inner future is dropped, which cancels any
/// work it still had pending.
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> DocgenResult<T>
where
    F: std::future::Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(DocgenError::Timeout {
            operation: operation_name.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation("timeout")
                .with_metadata("timeout_ms", &timeout_ms.to_string())
                .with_suggestion("Increase the analysis deadline")
                .with_suggestion("Check network connectivity"),
        }),
    }
}

/// Run `processor` over `items` with at most `max_concurrent` futures in flight
///
/// Results come back in completion order. The futures are polled by the
/// caller's task, never spawned.
pub async fn process_concurrently<T, R, F, Fut>(
    items: Vec<T>,
    max_concurrent: usize,
    processor: F,
) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = R>,
{
    stream::iter(items)
        .map(processor)
        .buffer_unordered(max_concurrent.max(1))
        .collect::<Vec<_>>()
        .await
}
