//! Charts sub-client: cached, rate-limited, fenced history loads.

use crate::cache::CacheKey;
use crate::client::DashboardClient;
use crate::config::{ms, DashboardConfig};
use crate::domain::chart::ChartSeries;
use crate::error::HttpError;
use crate::http::reached_server;
use crate::rate_limit::COINCAP;
use crate::shared::{now_ms, Period};
use crate::state::DashboardState;
use std::time::Duration;

/// A series ready to draw, with the y-axis bounds to draw it in.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRender {
    pub series: ChartSeries,
    pub y_range: (f64, f64),
}

/// Why a cached series was drawn instead of a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheReason {
    /// Younger than the chart TTL.
    Valid,
    RateLimited,
    /// The fetch failed and this stale copy was the best available.
    FetchFailed,
}

/// Outcome of [`Charts::load`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChartLoad {
    Fresh(ChartRender),
    Cached {
        render: ChartRender,
        reason: CacheReason,
    },
    /// Rate limited with nothing cached. Nothing to draw.
    RateLimited,
    /// The fetch failed with nothing cached. The chart must be cleared.
    Failed { error: String },
    /// A later load took over. The response was cached but not drawn.
    Superseded { period: Period },
}

impl ChartLoad {
    pub fn render(&self) -> Option<&ChartRender> {
        match self {
            ChartLoad::Fresh(render) | ChartLoad::Cached { render, .. } => Some(render),
            _ => None,
        }
    }

    /// Delay before the load is retried, when it needs one.
    pub fn retry_after(&self, config: &DashboardConfig) -> Option<Duration> {
        match self {
            ChartLoad::RateLimited => Some(config.chart_retry_rate_limited),
            ChartLoad::Failed { .. } => Some(config.chart_retry_failed),
            _ => None,
        }
    }

    /// Delay before realtime updates resume. `None` when the load already
    /// resumed them or left that to a later load.
    pub fn resume_after(&self, config: &DashboardConfig) -> Option<Duration> {
        match self {
            ChartLoad::Fresh(_)
            | ChartLoad::RateLimited
            | ChartLoad::Cached {
                reason: CacheReason::Valid | CacheReason::RateLimited,
                ..
            } => Some(config.resume_after_render),
            _ => None,
        }
    }
}

/// Sub-client for price history.
pub struct Charts<'a> {
    pub(crate) client: &'a DashboardClient,
}

impl<'a> Charts<'a> {
    /// Load the series of `period`, from cache when possible.
    ///
    /// Realtime updates are paused for the duration of the load. Failures
    /// resume them before returning; renders leave that to the caller after
    /// [`ChartLoad::resume_after`].
    pub async fn load(&self, period: Period) -> ChartLoad {
        let chart_ttl = ms(self.client.config.cache.chart_ttl);

        let (ticket, (start, end)) = {
            let mut state = self.client.state.lock().await;
            let now = now_ms();
            state.ticker.pause();

            if state.cache.is_valid(&CacheKey::Chart(period), chart_ttl, now) {
                if let Some(load) = draw_cached(&mut state, period, CacheReason::Valid) {
                    tracing::debug!(%period, "chart served from cache");
                    return load;
                }
            }
            if !state.limiter.can_call(COINCAP, now) {
                tracing::debug!(%period, "chart load rate limited");
                return draw_cached(&mut state, period, CacheReason::RateLimited)
                    .unwrap_or(ChartLoad::RateLimited);
            }
            (state.fence.issue(period), period.window_ending_at(now))
        };

        let result = self.client.http.get_history(period, start, end).await;

        let now = now_ms();
        let mut state = self.client.state.lock().await;
        if reached_server(&result) {
            state.limiter.record_call(COINCAP, now);
        }
        let series = result.and_then(|r| r.into_points()).and_then(|points| {
            ChartSeries::from_history(period, &points, now)
                .ok_or_else(|| HttpError::EmptyPayload("no price data received".into()))
        });
        let current = state.fence.is_current(&ticket);

        match series {
            Ok(series) => {
                state.cache.put_chart(series.clone(), now);
                if !current {
                    tracing::debug!(%period, "chart response superseded");
                    return ChartLoad::Superseded { period };
                }
                let y_range = state.render_chart(&series);
                ChartLoad::Fresh(ChartRender { series, y_range })
            }
            Err(_) if !current => ChartLoad::Superseded { period },
            Err(e) => {
                tracing::warn!(%period, error = %e, "chart load failed");
                state.ticker.resume();
                draw_cached(&mut state, period, CacheReason::FetchFailed).unwrap_or(
                    ChartLoad::Failed {
                        error: e.to_string(),
                    },
                )
            }
        }
    }

    /// Active period and the age of its cache entry.
    pub async fn active(&self) -> (Period, Option<i64>) {
        let state = self.client.state.lock().await;
        let period = state.active_period();
        (period, state.chart_cache_age(period, now_ms()))
    }
}

fn draw_cached(state: &mut DashboardState, period: Period, reason: CacheReason) -> Option<ChartLoad> {
    let series = state.cache.chart(period)?.clone();
    let y_range = state.render_chart(&series);
    Some(ChartLoad::Cached {
        render: ChartRender { series, y_range },
        reason,
    })
}
