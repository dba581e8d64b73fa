//! Client-side sliding-window rate limiter.
//!
//! Each registered API keeps the timestamps of its recent calls. A call is
//! permitted only while both the trailing-minute and trailing-hour counts are
//! below their caps. Counts are recomputed by filtering on every check.

use crate::config::RateLimitConfig;
use crate::shared::{HOUR_MS, MINUTE_MS};
use std::collections::{HashMap, VecDeque};

/// Registry name of the CoinCap API.
pub const COINCAP: &str = "coincap";

#[derive(Debug, Clone)]
struct Window {
    limits: RateLimitConfig,
    calls: VecDeque<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    windows: HashMap<String, Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limiter with CoinCap registered under the given caps.
    pub fn with_coincap(limits: RateLimitConfig) -> Self {
        let mut limiter = Self::new();
        limiter.register(COINCAP, limits);
        limiter
    }

    /// Start tracking an API. Re-registering replaces the caps and keeps history.
    pub fn register(&mut self, api: &str, limits: RateLimitConfig) {
        self.windows
            .entry(api.to_string())
            .and_modify(|w| w.limits = limits)
            .or_insert_with(|| Window {
                limits,
                calls: VecDeque::new(),
            });
    }

    /// Whether a call to `api` is permitted at `now_ms`. Unregistered APIs always are.
    pub fn can_call(&self, api: &str, now_ms: i64) -> bool {
        let Some(window) = self.windows.get(api) else {
            return true;
        };
        let last_minute = count_after(&window.calls, now_ms - MINUTE_MS);
        let last_hour = count_after(&window.calls, now_ms - HOUR_MS);
        last_minute < window.limits.per_minute && last_hour < window.limits.per_hour
    }

    /// Record a call at `now_ms` and drop entries older than one hour.
    pub fn record_call(&mut self, api: &str, now_ms: i64) {
        let Some(window) = self.windows.get_mut(api) else {
            return;
        };
        window.calls.push_back(now_ms);
        let cutoff = now_ms - HOUR_MS;
        window.calls.retain(|&ts| ts > cutoff);
    }

    /// `can_call` followed by `record_call` when permitted.
    pub fn try_acquire(&mut self, api: &str, now_ms: i64) -> bool {
        if !self.can_call(api, now_ms) {
            tracing::debug!(api, "rate limit reached");
            return false;
        }
        self.record_call(api, now_ms);
        true
    }

    /// Number of retained calls inside the trailing `window_ms`.
    pub fn calls_within(&self, api: &str, window_ms: i64, now_ms: i64) -> usize {
        self.windows
            .get(api)
            .map(|w| count_after(&w.calls, now_ms - window_ms))
            .unwrap_or(0)
    }
}

fn count_after(calls: &VecDeque<i64>, cutoff: i64) -> usize {
    calls.iter().filter(|&&ts| ts > cutoff).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: usize, per_hour: usize) -> RateLimiter {
        RateLimiter::with_coincap(RateLimitConfig {
            per_minute,
            per_hour,
        })
    }

    #[test]
    fn test_unregistered_api_always_allowed() {
        let mut limiter = RateLimiter::new();
        for i in 0..500 {
            limiter.record_call("other", i);
        }
        assert!(limiter.can_call("other", 500));
        assert_eq!(limiter.calls_within("other", HOUR_MS, 500), 0);
    }

    #[test]
    fn test_minute_cap_until_oldest_ages_out() {
        let mut limiter = limiter(100, 2000);
        let start = 1_000_000;
        for i in 0..100 {
            limiter.record_call(COINCAP, start + i * 100);
        }
        assert!(!limiter.can_call(COINCAP, start + 10_000));
        assert!(!limiter.can_call(COINCAP, start + MINUTE_MS - 1));
        // Oldest call is exactly 60s old: outside the window.
        assert!(limiter.can_call(COINCAP, start + MINUTE_MS));
    }

    #[test]
    fn test_hour_cap() {
        let mut limiter = limiter(1000, 5);
        for i in 0..5 {
            limiter.record_call(COINCAP, i * 2 * MINUTE_MS);
        }
        assert!(!limiter.can_call(COINCAP, 20 * MINUTE_MS));
        assert!(limiter.can_call(COINCAP, HOUR_MS + 1));
    }

    #[test]
    fn test_record_prunes_entries_older_than_an_hour() {
        let mut limiter = limiter(100, 2000);
        limiter.record_call(COINCAP, 0);
        limiter.record_call(COINCAP, HOUR_MS + 5);
        assert_eq!(limiter.calls_within(COINCAP, 10 * HOUR_MS, HOUR_MS + 5), 1);
    }

    #[test]
    fn test_try_acquire_records_only_when_permitted() {
        let mut limiter = limiter(2, 2000);
        assert!(limiter.try_acquire(COINCAP, 0));
        assert!(limiter.try_acquire(COINCAP, 1));
        assert!(!limiter.try_acquire(COINCAP, 2));
        assert_eq!(limiter.calls_within(COINCAP, MINUTE_MS, 2), 2);
    }
}
