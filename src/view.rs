//! Typed view updates.
//!
//! The engine never touches a document. It emits [`ViewUpdate`]s and the
//! renderer applies them. The helpers here map domain outcomes to updates,
//! including the exact copy the dashboard shows.

use crate::config::DashboardConfig;
use crate::domain::chart::client::ChartLoad;
use crate::domain::chart::ChartSeries;
use crate::domain::market::client::SummaryOutcome;
use crate::domain::market::{BalanceCard, MarketStats};
use crate::domain::price::client::PriceFetch;
use crate::domain::price::{PriceDirection, PriceUpdate};
use crate::page::starfield::{ShootingStar, Starfield};
use crate::shared::Period;
use crate::state::{FeedStatus, LiveEffect};
use std::time::Duration;

pub const RATE_LIMITED: &str = "Rate Limited";
pub const DATA_UNAVAILABLE: &str = "Data Unavailable";
pub const CHART_RATE_LIMITED: &str = "Chart Data Unavailable (Rate Limited)";
pub const CHART_UNAVAILABLE: &str = "Chart Data Unavailable";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// New price label, flashed up or down.
    Price {
        text: String,
        direction: PriceDirection,
        floating_delta: Option<String>,
        flash_for: Duration,
    },
    /// Temporary text in place of the price.
    PriceNotice { text: String, revert_after: Duration },
    Balance(BalanceCard),

    ChartLoading(bool),
    Chart {
        period: Period,
        labels: Vec<String>,
        values: Vec<f64>,
        y_min: f64,
        y_max: f64,
    },
    /// Live 12h series after an accepted price.
    LiveChart {
        labels: Vec<String>,
        values: Vec<f64>,
        y_range: Option<(f64, f64)>,
    },
    ChartCleared,
    ChartBanner { text: String, clear_after: Duration },
    /// Text drawn over the chart area; `None` removes it.
    ChartOverlay(Option<String>),
    ChartHeader(String),
    PeriodChange {
        period: Period,
        label: String,
        positive: bool,
    },
    ActivePeriod(Period),

    Stats(MarketStats),
    Transactions([String; 3]),
    Feed(FeedStatus),

    Stars(Starfield),
    ShootingStar(ShootingStar),
}

pub fn chart_header(period: Period) -> ViewUpdate {
    ViewUpdate::ChartHeader(format!("Price History ({})", period))
}

pub fn retry_notice(delay: Duration) -> String {
    format!("Retrying in {}s...", delay.as_secs())
}

/// Price label and balance card for an accepted price.
pub fn price_updates(update: &PriceUpdate, config: &DashboardConfig, balance: BalanceCard) -> Vec<ViewUpdate> {
    vec![
        ViewUpdate::Price {
            text: update.label(),
            direction: update.direction(),
            floating_delta: update.floating_delta(),
            flash_for: config.price_flash,
        },
        ViewUpdate::Balance(balance),
    ]
}

pub fn live_chart(effect: LiveEffect) -> ViewUpdate {
    ViewUpdate::LiveChart {
        labels: effect.labels,
        values: effect.values,
        y_range: effect.y_range,
    }
}

/// Temporary label for a poll that produced no price. Only shown while no
/// price has been displayed yet.
pub fn price_notice(fetch: &PriceFetch, has_price: bool, config: &DashboardConfig) -> Option<ViewUpdate> {
    if has_price {
        return None;
    }
    let (text, revert_after) = match fetch {
        PriceFetch::RateLimited => (RATE_LIMITED, config.rate_limited_label),
        PriceFetch::Unavailable(_) => (DATA_UNAVAILABLE, config.unavailable_label),
        _ => return None,
    };
    Some(ViewUpdate::PriceNotice {
        text: text.to_string(),
        revert_after,
    })
}

fn draw(series: &ChartSeries, y_range: (f64, f64)) -> Vec<ViewUpdate> {
    let mut updates = vec![
        ViewUpdate::ChartOverlay(None),
        ViewUpdate::Chart {
            period: series.period,
            labels: series.labels.clone(),
            values: series.values.clone(),
            y_min: y_range.0,
            y_max: y_range.1,
        },
    ];
    if let (Some(label), Some(pct)) = (series.change_label(), series.change_percent()) {
        updates.push(ViewUpdate::PeriodChange {
            period: series.period,
            label,
            positive: pct >= 0.0,
        });
    }
    updates
}

/// Updates for a finished chart load. A superseded load changes nothing.
pub fn chart_load_updates(load: &ChartLoad, config: &DashboardConfig) -> Vec<ViewUpdate> {
    let mut updates = match load {
        ChartLoad::Fresh(render) | ChartLoad::Cached { render, .. } => {
            draw(&render.series, render.y_range)
        }
        ChartLoad::RateLimited => vec![
            ViewUpdate::ChartBanner {
                text: CHART_RATE_LIMITED.to_string(),
                clear_after: config.chart_banner,
            },
            ViewUpdate::ChartOverlay(Some(retry_notice(config.chart_retry_rate_limited))),
        ],
        ChartLoad::Failed { .. } => vec![
            ViewUpdate::ChartCleared,
            ViewUpdate::ChartBanner {
                text: CHART_UNAVAILABLE.to_string(),
                clear_after: config.chart_banner,
            },
            ViewUpdate::ChartOverlay(Some(format!(
                "No Data Available\n{}",
                retry_notice(config.chart_retry_failed)
            ))),
        ],
        ChartLoad::Superseded { .. } => return Vec::new(),
    };
    updates.push(ViewUpdate::ChartLoading(false));
    updates
}

/// Stat tiles for a summary, plus the price label when the summary supplied
/// the first price.
pub fn summary_updates(outcome: &SummaryOutcome, config: &DashboardConfig, balance: BalanceCard) -> Vec<ViewUpdate> {
    let mut updates = vec![ViewUpdate::Stats(outcome.summary.stats())];
    match &outcome.price_update {
        Some(update) => updates.extend(price_updates(update, config, balance)),
        None => updates.push(ViewUpdate::Balance(balance)),
    }
    updates
}
