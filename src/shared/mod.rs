//! Shared types and utilities used across all domain modules.
//!
//! `Period` serializes identically to the label the dashboard shows on its
//! period buttons, so it can be used directly as a cache-key component.

pub mod fmt;
pub mod serde_util;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Milliseconds in one minute.
pub const MINUTE_MS: i64 = 60_000;
/// Milliseconds in one hour.
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Current wall-clock time as Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ─── Period ──────────────────────────────────────────────────────────────────

/// Chart time period selectable on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "12h")]
    Hours12,
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "7d")]
    Days7,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Hours12, Period::Hours24, Period::Days7];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours12 => "12h",
            Self::Hours24 => "24h",
            Self::Days7 => "7d",
        }
    }

    /// CoinCap history sampling interval.
    pub fn interval(&self) -> &'static str {
        match self {
            Self::Hours12 => "m30",
            Self::Hours24 => "h1",
            Self::Days7 => "h6",
        }
    }

    /// Length of the history window in milliseconds.
    pub fn window_ms(&self) -> i64 {
        match self {
            Self::Hours12 => 12 * HOUR_MS,
            Self::Hours24 => DAY_MS,
            Self::Days7 => 7 * DAY_MS,
        }
    }

    /// `(start, end)` of the history window ending at `now_ms`.
    pub fn window_ending_at(&self, now_ms: i64) -> (i64, i64) {
        (now_ms - self.window_ms(), now_ms)
    }

    /// Whether this period receives live points from the price feed.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Hours12)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "12h" => Ok(Self::Hours12),
            "24h" => Ok(Self::Hours24),
            "7d" => Ok(Self::Days7),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}
