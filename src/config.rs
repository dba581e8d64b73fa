//! Dashboard thresholds.
//!
//! Every interval, TTL and cap the engine uses lives here. Durations
//! serialize as integer milliseconds so a config can be loaded from JSON.

use crate::shared::serde_util::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-API call caps over the two sliding windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub per_minute: usize,
    pub per_hour: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 100,
            per_hour: 2000,
        }
    }
}

/// TTL for each cache class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(with = "duration_ms")]
    pub chart_ttl: Duration,
    #[serde(with = "duration_ms")]
    pub dashboard_ttl: Duration,
    #[serde(with = "duration_ms")]
    pub default_ttl: Duration,
    /// How often expired entries are swept.
    #[serde(with = "duration_ms")]
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            chart_ttl: Duration::from_secs(30 * 60),
            dashboard_ttl: Duration::from_secs(5 * 60),
            default_ttl: Duration::from_secs(10 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// All engine thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,

    /// Minimum gap between accepted WebSocket ticks.
    #[serde(with = "duration_ms")]
    pub tick_throttle: Duration,
    /// A REST poll is skipped when the last update is younger than this.
    #[serde(with = "duration_ms")]
    pub poll_min_gap: Duration,
    /// Interval of the regular REST price poll.
    #[serde(with = "duration_ms")]
    pub price_poll_interval: Duration,
    /// Interval of the REST poll that runs while the socket is down.
    #[serde(with = "duration_ms")]
    pub fallback_poll_interval: Duration,

    #[serde(with = "duration_ms")]
    pub chart_refresh_interval: Duration,
    #[serde(with = "duration_ms")]
    pub dashboard_refresh_interval: Duration,
    /// Cache age under which a period switch renders without reloading.
    #[serde(with = "duration_ms")]
    pub period_fresh_window: Duration,
    #[serde(with = "duration_ms")]
    pub period_debounce: Duration,

    #[serde(with = "duration_ms")]
    pub chart_retry_rate_limited: Duration,
    #[serde(with = "duration_ms")]
    pub chart_retry_failed: Duration,
    #[serde(with = "duration_ms")]
    pub chart_banner: Duration,
    /// Delay before realtime updates resume after a chart render.
    #[serde(with = "duration_ms")]
    pub resume_after_render: Duration,

    #[serde(with = "duration_ms")]
    pub rate_limited_label: Duration,
    #[serde(with = "duration_ms")]
    pub unavailable_label: Duration,
    #[serde(with = "duration_ms")]
    pub price_flash: Duration,

    /// Maximum points kept in the live 12h series.
    pub live_points: usize,
    /// Minimum gap between two live points.
    #[serde(with = "duration_ms")]
    pub live_point_gap: Duration,

    /// Market dominance shown when CoinGecko is unavailable.
    pub dominance_fallback: f64,
    /// Demo wallet holding shown on the balance card.
    pub demo_balance_btc: f64,
    /// Ping the auth backend before submitting a password.
    pub wake_up_before_login: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            tick_throttle: Duration::from_secs(5),
            poll_min_gap: Duration::from_secs(15),
            price_poll_interval: Duration::from_secs(30),
            fallback_poll_interval: Duration::from_secs(30),
            chart_refresh_interval: Duration::from_secs(120),
            dashboard_refresh_interval: Duration::from_secs(120),
            period_fresh_window: Duration::from_secs(60),
            period_debounce: Duration::from_secs(1),
            chart_retry_rate_limited: Duration::from_secs(5),
            chart_retry_failed: Duration::from_secs(15),
            chart_banner: Duration::from_secs(3),
            resume_after_render: Duration::from_secs(1),
            rate_limited_label: Duration::from_secs(60),
            unavailable_label: Duration::from_secs(5),
            price_flash: Duration::from_secs(1),
            live_points: 24,
            live_point_gap: Duration::from_secs(30),
            dominance_fallback: 60.5,
            demo_balance_btc: 0.8756,
            wake_up_before_login: true,
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Milliseconds of a duration as the signed type the state containers use.
pub(crate) fn ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
