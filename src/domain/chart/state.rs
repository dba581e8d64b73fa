//! Chart state containers: live series, y-axis range, period switching and
//! request fencing.

use super::{ChartSeries, RANGE_PADDING};
use crate::config::{ms, DashboardConfig};
use crate::shared::Period;
use std::collections::VecDeque;

// ─── Live series ─────────────────────────────────────────────────────────────

/// The 12h series that grows with accepted live prices.
#[derive(Debug, Clone)]
pub struct RealtimeSeries {
    labels: VecDeque<String>,
    values: VecDeque<f64>,
    capacity: usize,
    min_gap_ms: i64,
    last_point_at: Option<i64>,
}

impl Default for RealtimeSeries {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl RealtimeSeries {
    pub fn new(capacity: usize, min_gap_ms: i64) -> Self {
        Self {
            labels: VecDeque::with_capacity(capacity + 1),
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
            min_gap_ms,
            last_point_at: None,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.live_points, ms(config.live_point_gap))
    }

    /// Replace the points with a freshly rendered series.
    pub fn reset_from(&mut self, series: &ChartSeries) {
        self.labels = series.labels.iter().cloned().collect();
        self.values = series.values.iter().copied().collect();
        self.trim();
    }

    /// Append a live point unless one was added less than the gap ago.
    pub fn push(&mut self, price: f64, label: String, now_ms: i64) -> bool {
        if let Some(last) = self.last_point_at {
            if now_ms - last < self.min_gap_ms {
                return false;
            }
        }
        self.labels.push_back(label);
        self.values.push_back(price);
        self.trim();
        self.last_point_at = Some(now_ms);
        true
    }

    fn trim(&mut self) {
        while self.values.len() > self.capacity {
            self.labels.pop_front();
            self.values.pop_front();
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ─── Axis range ──────────────────────────────────────────────────────────────

/// Y-axis bounds. Once set, the range only ever widens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    bounds: Option<(f64, f64)>,
}

impl PriceRange {
    /// Fold a rendered series into the range, padding by a tenth of its span.
    pub fn absorb(&mut self, series: &ChartSeries) -> (f64, f64) {
        let buffer = (series.max - series.min) * RANGE_PADDING;
        let next = match self.bounds {
            None => (series.min - buffer, series.max + buffer),
            Some((lo, hi)) => (
                if series.min < lo { series.min - buffer } else { lo },
                if series.max > hi { series.max + buffer } else { hi },
            ),
        };
        self.bounds = Some(next);
        next
    }

    /// Widen for a live price: 5% headroom on the side that was crossed.
    /// Returns the new bounds when they changed.
    pub fn expand_for(&mut self, price: f64) -> Option<(f64, f64)> {
        let (lo, hi) = self.bounds?;
        let next = if price > hi {
            (lo, price * 1.05)
        } else if price < lo {
            (price * 0.95, hi)
        } else {
            return None;
        };
        self.bounds = Some(next);
        Some(next)
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }
}

// ─── Period switching ────────────────────────────────────────────────────────

/// What to do after the user picks a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDecision {
    /// The period was already active.
    Unchanged,
    /// Render the cached series without a network load.
    ServeCached,
    /// Start a load now.
    LoadNow,
    /// Load after `delay_ms`. Replaces any earlier deferred load.
    Defer { delay_ms: i64 },
}

#[derive(Debug, Clone)]
pub struct PeriodSwitcher {
    active: Period,
    last_load_started: Option<i64>,
    fresh_window_ms: i64,
    debounce_ms: i64,
}

impl Default for PeriodSwitcher {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl PeriodSwitcher {
    pub fn new(fresh_window_ms: i64, debounce_ms: i64) -> Self {
        Self {
            active: Period::default(),
            last_load_started: None,
            fresh_window_ms,
            debounce_ms,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(ms(config.period_fresh_window), ms(config.period_debounce))
    }

    pub fn active(&self) -> Period {
        self.active
    }

    /// Switch to `period`. `cache_age_ms` is the age of its cached series.
    pub fn select(&mut self, period: Period, cache_age_ms: Option<i64>, now_ms: i64) -> SwitchDecision {
        if period == self.active {
            return SwitchDecision::Unchanged;
        }
        self.active = period;

        if cache_age_ms.is_some_and(|age| age < self.fresh_window_ms) {
            return SwitchDecision::ServeCached;
        }
        match self.last_load_started {
            Some(last) if now_ms - last < self.debounce_ms => SwitchDecision::Defer {
                delay_ms: last + self.debounce_ms - now_ms,
            },
            _ => {
                self.last_load_started = Some(now_ms);
                SwitchDecision::LoadNow
            }
        }
    }

    /// Record that a switch-triggered load started (deferred loads call this
    /// when they fire).
    pub fn mark_load_started(&mut self, now_ms: i64) {
        self.last_load_started = Some(now_ms);
    }
}

// ─── Request fencing ─────────────────────────────────────────────────────────

/// Identifies one network chart load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub period: Period,
    seq: u64,
}

/// Only the latest load may render. Anything issued earlier is superseded.
#[derive(Debug, Clone, Default)]
pub struct RequestFence {
    seq: u64,
}

impl RequestFence {
    pub fn issue(&mut self, period: Period) -> Ticket {
        self.seq += 1;
        Ticket {
            period,
            seq: self.seq,
        }
    }

    /// Supersede every outstanding ticket without issuing a new one.
    pub fn invalidate(&mut self) {
        self.seq += 1;
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.seq == self.seq
    }
}
