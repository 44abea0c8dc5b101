//! Global sliding-window rate limiter (spec §4.8, §5, §8 property 6).
//!
//! The external deployment backs this with a Redis sliding window; in this
//! crate it is an in-process equivalent keyed the same way (tenant-prefixed,
//! spec §5's "shared-resource policy"), so the core's behavior is testable
//! without a live cache dependency. Swapping the storage is a matter of
//! implementing `RateLimiterBackend` against a real shared store.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tunables: `rate_limit_requests` per `rate_limit_window` (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Max operations allowed per window, per key.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// A sliding-window counter keyed by tenant (user id) or a process-wide
/// namespace.
pub struct RateLimiter {
    config: RateLimiterConfig,
    windows: DashMap<String, Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Construct with the given config.
    #[must_use]
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Attempt to record one operation for `key`. Returns `true` if allowed
    /// (and records it), `false` if the window is saturated.
    pub fn try_acquire(&self, key: &str) -> bool {
        let entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut window = entry.lock();
        let now = Instant::now();
        while let Some(&front) = window.front() {
            if now.duration_since(front) > self.config.window {
                window.pop_front();
            } else {
                break;
            }
        }
        if window.len() as u32 >= self.config.max_requests {
            false
        } else {
            window.push_back(now);
            true
        }
    }

    /// Seconds until the oldest recorded operation ages out of the window,
    /// suitable for a `retry-after` header, if currently saturated.
    #[must_use]
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        let entry = self.windows.get(key)?;
        let window = entry.lock();
        let front = *window.front()?;
        if window.len() as u32 >= self.config.max_requests {
            Some(self.config.window.saturating_sub(front.elapsed()))
        } else {
            None
        }
    }
}
