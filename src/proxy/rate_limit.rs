//! Per-address sliding-window rate limiting
//!
//! Each client address keeps the instants of its recent requests. A check
//! first drops every instant older than the window for all addresses, then
//! admits the request if the caller still has room.

use crate::error::ChatBridgeError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Sliding-window limiter shared by all request handlers
///
/// Cloning is cheap and every clone shares one table. The table lives in
/// this process only.
#[derive(Debug, Clone)]
pub struct SlidingWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl SlidingWindowRateLimiter {
    /// Create a limiter admitting `max_requests` per `window` per address
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Record a request from `addr` if it is within quota
    ///
    /// # Returns
    ///
    /// Returns the number of requests still available in the window
    ///
    /// # Errors
    ///
    /// Returns [`ChatBridgeError::RateLimitExceeded`] when `addr` is over quota
    ///
    /// # Examples
    ///
    /// ```
    /// use chatbridge::proxy::SlidingWindowRateLimiter;
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let limiter = SlidingWindowRateLimiter::new(2, Duration::from_secs(60));
    /// assert_eq!(limiter.check("203.0.113.7").await.unwrap(), 1);
    /// assert_eq!(limiter.check("203.0.113.7").await.unwrap(), 0);
    /// assert!(limiter.check("203.0.113.7").await.is_err());
    /// # });
    /// ```
    pub async fn check(&self, addr: &str) -> Result<u32, ChatBridgeError> {
        self.check_at(addr, Instant::now()).await
    }

    /// Same as [`check`](Self::check) at an explicit instant
    pub async fn check_at(&self, addr: &str, now: Instant) -> Result<u32, ChatBridgeError> {
        let mut table = self.requests.lock().await;
        let window = self.window;

        table.retain(|_, stamps| {
            stamps.retain(|t| now.saturating_duration_since(*t) < window);
            !stamps.is_empty()
        });

        let stamps = table.entry(addr.to_string()).or_default();
        if stamps.len() >= self.max_requests as usize {
            let oldest = stamps.iter().min().copied().unwrap_or(now);
            let reset_after = window.saturating_sub(now.saturating_duration_since(oldest));
            let reset_after_secs = reset_after.as_secs() + u64::from(reset_after.subsec_nanos() > 0);

            tracing::warn!(addr, limit = self.max_requests, "Rate limit exceeded");
            return Err(ChatBridgeError::RateLimitExceeded {
                limit: self.max_requests,
                remaining: 0,
                reset_after_secs: reset_after_secs.max(1),
            });
        }

        stamps.push(now);
        let remaining = self.max_requests - stamps.len() as u32;
        tracing::debug!(addr, remaining, "Rate limit check passed");
        Ok(remaining)
    }

    /// Number of addresses currently tracked
    pub async fn tracked_addresses(&self) -> usize {
        self.requests.lock().await.len()
    }
}
