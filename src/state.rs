//! Per-page state container of the BTC dashboard.
//!
//! Everything the page mutates lives in one [`DashboardState`]: rate-limit
//! windows, the TTL cache, the price ticker (which owns the pause flag), the
//! live 12h series, the y-axis range, the period switcher, the request fence
//! and the feed status. It is created when the page starts and dropped when
//! the page is left.

use crate::cache::{CacheKey, TtlCache};
use crate::config::DashboardConfig;
use crate::domain::chart::{ChartSeries, PeriodSwitcher, PriceRange, RealtimeSeries, RequestFence};
use crate::domain::price::PriceTicker;
use crate::rate_limit::RateLimiter;
use crate::shared::fmt::time;
use crate::shared::Period;

/// Live-series change caused by an accepted price.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveEffect {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// New y-axis bounds, when the price crossed the old ones.
    pub y_range: Option<(f64, f64)>,
}

/// Whether the socket is up and whether the REST fallback poll runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStatus {
    pub connected: bool,
    pub fallback_polling: bool,
}

impl FeedStatus {
    /// Socket opened. Returns `true` when the fallback poll must stop.
    pub fn open(&mut self) -> bool {
        self.connected = true;
        std::mem::take(&mut self.fallback_polling)
    }

    /// Socket closed or failed. Returns `true` when the fallback poll must
    /// start; it is never started twice.
    pub fn outage(&mut self) -> bool {
        self.connected = false;
        !std::mem::replace(&mut self.fallback_polling, true)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub limiter: RateLimiter,
    pub cache: TtlCache,
    pub ticker: PriceTicker,
    pub live: RealtimeSeries,
    pub range: PriceRange,
    pub switcher: PeriodSwitcher,
    pub fence: RequestFence,
    pub feed: FeedStatus,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            limiter: RateLimiter::with_coincap(config.rate_limit),
            cache: TtlCache::new(config.cache),
            ticker: PriceTicker::from_config(config),
            live: RealtimeSeries::from_config(config),
            range: PriceRange::default(),
            switcher: PeriodSwitcher::from_config(config),
            fence: RequestFence::default(),
            feed: FeedStatus::default(),
        }
    }

    pub fn active_period(&self) -> Period {
        self.switcher.active()
    }

    /// Age of the cached series of `period`, if one is cached.
    pub fn chart_cache_age(&self, period: Period, now_ms: i64) -> Option<i64> {
        self.cache.age(&CacheKey::Chart(period), now_ms)
    }

    /// Fold an accepted price into the live chart. Only the 12h period is
    /// live, and at most one point is added per gap.
    pub fn apply_live_price(&mut self, price: f64, now_ms: i64) -> Option<LiveEffect> {
        if !self.switcher.active().is_live() || self.ticker.is_paused() {
            return None;
        }
        if !self.live.push(price, time::clock_label(now_ms), now_ms) {
            return None;
        }
        Some(LiveEffect {
            labels: self.live.labels(),
            values: self.live.values(),
            y_range: self.range.expand_for(price),
        })
    }

    /// Bookkeeping for a chart render: widen the axis range and, for the live
    /// period, restart the live series from the rendered points.
    pub fn render_chart(&mut self, series: &ChartSeries) -> (f64, f64) {
        if series.period.is_live() {
            self.live.reset_from(series);
        }
        self.range.absorb(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::HistoryPoint;

    fn series(period: Period, values: &[f64]) -> ChartSeries {
        let pts: Vec<HistoryPoint> = values
            .iter()
            .enumerate()
            .map(|(i, v)| HistoryPoint {
                price: *v,
                time: i as i64,
            })
            .collect();
        ChartSeries::from_history_with(period, &pts, 0, |_, t| t.to_string()).unwrap()
    }

    #[test]
    fn test_feed_status_transitions() {
        let mut feed = FeedStatus::default();
        assert!(feed.outage());
        assert!(!feed.outage(), "fallback must not start twice");
        assert!(feed.fallback_polling);
        assert!(feed.open());
        assert!(feed.connected);
        assert!(!feed.open());
    }

    #[test]
    fn test_live_price_only_on_live_period() {
        let mut state = DashboardState::default();
        state.render_chart(&series(Period::Hours12, &[100.0, 200.0]));

        let effect = state.apply_live_price(150.0, 0).unwrap();
        assert_eq!(effect.values, vec![100.0, 200.0, 150.0]);
        assert_eq!(effect.y_range, None);

        assert!(state.apply_live_price(160.0, 10_000).is_none(), "within the point gap");

        state.switcher.select(Period::Days7, None, 50_000);
        assert!(state.apply_live_price(170.0, 60_000).is_none());
    }

    #[test]
    fn test_live_price_widens_range() {
        let mut state = DashboardState::default();
        state.render_chart(&series(Period::Hours12, &[100.0, 200.0]));
        let effect = state.apply_live_price(1_000.0, 0).unwrap();
        let (_, hi) = effect.y_range.unwrap();
        assert!((hi - 1_050.0).abs() < 1e-9);
    }

    #[test]
    fn test_paused_ticker_blocks_live_points() {
        let mut state = DashboardState::default();
        state.ticker.pause();
        assert!(state.apply_live_price(1.0, 0).is_none());
    }

    #[test]
    fn test_render_resets_live_series_for_live_period_only() {
        let mut state = DashboardState::default();
        state.render_chart(&series(Period::Hours24, &[1.0, 2.0, 3.0]));
        assert!(state.live.is_empty());
        state.render_chart(&series(Period::Hours12, &[1.0, 2.0]));
        assert_eq!(state.live.len(), 2);
    }
}
