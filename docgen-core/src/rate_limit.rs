//! Caller-scoped sliding-window rate limiting
//!
//! Sits in front of the analysis entry points. Each caller identity keeps the
//! timestamps of its requests inside the current window; stale timestamps are
//! pruned on every check and empty callers are dropped, so memory stays
//! bounded by `max_tracked_callers`.

use crate::error::{DocgenError, DocgenResult, ErrorContext};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    max_tracked_callers: usize,
    callers: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration, max_tracked_callers: usize) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            max_tracked_callers: max_tracked_callers.max(1),
            callers: Mutex::new(HashMap::new()),
        }
    }

    /// `requests_per_minute` requests per caller in any sixty second window
    pub fn per_minute(requests_per_minute: usize, max_tracked_callers: usize) -> Self {
        Self::new(
            requests_per_minute,
            Duration::from_secs(60),
            max_tracked_callers,
        )
    }

    /// Record a request for `caller` or reject it with a rate limit error
    pub async fn check(&self, caller: &str) -> DocgenResult<()> {
        self.check_at(caller, Instant::now()).await
    }

    pub async fn check_at(&self, caller: &str, now: Instant) -> DocgenResult<()> {
        let mut callers = self.callers.lock().await;

        let window = self.window;
        callers.retain(|_, stamps| {
            while stamps
                .front()
                .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= window)
            {
                stamps.pop_front();
            }
            !stamps.is_empty()
        });

        if let Some(stamps) = callers.get_mut(caller) {
            if stamps.len() >= self.max_requests {
                let retry_after = stamps
                    .front()
                    .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                    .unwrap_or(window);

                debug!(caller = caller, retry_after_ms = retry_after.as_millis() as u64, "Caller over budget");

                return Err(DocgenError::RateLimit {
                    message: format!(
                        "More than {} requests within {} seconds",
                        self.max_requests,
                        window.as_secs()
                    ),
                    retry_after_ms: Some(retry_after.as_millis() as u64),
                    context: ErrorContext::new("rate_limiter")
                        .with_operation("check")
                        .with_metadata("caller", caller),
                });
            }
            stamps.push_back(now);
            return Ok(());
        }

        if callers.len() >= self.max_tracked_callers {
            let least_recent = callers
                .iter()
                .filter_map(|(key, stamps)| stamps.back().map(|last| (key.clone(), *last)))
                .min_by_key(|(_, last)| *last)
                .map(|(key, _)| key);
            if let Some(key) = least_recent {
                callers.remove(&key);
            }
        }

        callers.insert(caller.to_string(), VecDeque::from([now]));
        Ok(())
    }

    /// Number of callers currently tracked
    pub async fn tracked_callers(&self) -> usize {
        self.callers.lock().await.len()
    }
}
