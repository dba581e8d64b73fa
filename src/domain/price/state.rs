//! Price ticker state container.
//!
//! Owns the displayed price, the time of the last accepted update and the
//! realtime pause flag. Every time-dependent method takes `now_ms` explicitly.

use super::{PriceSample, PriceSource, PriceUpdate};
use crate::config::{ms, DashboardConfig};

#[derive(Debug, Clone)]
pub struct PriceTicker {
    current: Option<PriceSample>,
    last_update: Option<i64>,
    paused: bool,
    throttle_ms: i64,
    poll_min_gap_ms: i64,
}

impl Default for PriceTicker {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl PriceTicker {
    pub fn new(throttle_ms: i64, poll_min_gap_ms: i64) -> Self {
        Self {
            current: None,
            last_update: None,
            paused: false,
            throttle_ms,
            poll_min_gap_ms,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(ms(config.tick_throttle), ms(config.poll_min_gap))
    }

    /// Offer a streamed tick. Accepted only when realtime updates are running
    /// and at least the throttle window has passed since the last update.
    pub fn offer_tick(&mut self, price: f64, now_ms: i64) -> Option<PriceUpdate> {
        if self.paused {
            return None;
        }
        if let Some(last) = self.last_update {
            if now_ms - last < self.throttle_ms {
                return None;
            }
        }
        Some(self.apply(price, now_ms, PriceSource::Stream))
    }

    /// Whether a REST poll should run now.
    pub fn should_poll(&self, now_ms: i64) -> bool {
        if self.paused {
            return false;
        }
        match self.last_update {
            Some(last) => now_ms - last >= self.poll_min_gap_ms,
            None => true,
        }
    }

    /// Record that a poll reached the server, whatever its outcome.
    pub fn mark_polled(&mut self, now_ms: i64) {
        self.last_update = Some(now_ms);
    }

    /// Unconditionally display `price`.
    pub fn apply(&mut self, price: f64, now_ms: i64, source: PriceSource) -> PriceUpdate {
        let previous = self.current.map(|s| s.price);
        let sample = PriceSample {
            price,
            observed_at: now_ms,
        };
        self.current = Some(sample);
        self.last_update = Some(now_ms);
        PriceUpdate {
            sample,
            previous,
            source,
        }
    }

    /// Display a price from the summary without counting it as a realtime
    /// update, so the next tick is not throttled.
    pub fn adopt(&mut self, price: f64, now_ms: i64) -> PriceUpdate {
        let previous = self.current.map(|s| s.price);
        let sample = PriceSample {
            price,
            observed_at: now_ms,
        };
        self.current = Some(sample);
        PriceUpdate {
            sample,
            previous,
            source: PriceSource::Poll,
        }
    }

    pub fn current(&self) -> Option<PriceSample> {
        self.current
    }

    pub fn price(&self) -> Option<f64> {
        self.current.map(|s| s.price)
    }

    pub fn last_update(&self) -> Option<i64> {
        self.last_update
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
