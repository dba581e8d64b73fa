//! Market domain: the dashboard summary stats, the demo balance card and the
//! demo transaction list.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use crate::domain::price::wire::AssetData;
use crate::shared::fmt::{num, time};
use crate::shared::{DAY_MS, MINUTE_MS};
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Circulating supply assumed by synthesized summaries.
pub const FALLBACK_SUPPLY: f64 = 19_840_000.0;
/// 24h change assumed by synthesized summaries.
pub const FALLBACK_CHANGE_24H: f64 = 1.2;
/// Share of market cap assumed as 24h volume by synthesized summaries.
pub const FALLBACK_VOLUME_RATIO: f64 = 0.02;
/// Centre of the random price used when nothing is known.
pub const PLAUSIBLE_PRICE: f64 = 37_000.0;
/// Label shown for a stat with no value.
pub const UNAVAILABLE: &str = "Data Unavailable";

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Market summary behind the four stat tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub price: Option<f64>,
    pub change_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub supply: Option<f64>,
    pub dominance: Option<f64>,
    pub fetched_at: i64,
}

/// How a summary was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummarySource {
    Fresh,
    Cached,
    /// Built locally after every upstream failed.
    Synthesized,
}

/// Formatted stat tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStats {
    pub market_cap: String,
    pub volume_24h: String,
    pub dominance: String,
    pub supply: String,
}

impl MarketSummary {
    pub fn from_asset(asset: AssetData, dominance: f64, fetched_at: i64) -> Self {
        Self {
            price: asset.price_usd,
            change_24h: asset.change_percent24_hr,
            market_cap: asset.market_cap_usd,
            volume_24h: asset.volume_usd24_hr,
            supply: asset.supply,
            dominance: Some(dominance),
            fetched_at,
        }
    }

    /// Plausible stats derived from a single price.
    pub fn synthesized(price: f64, dominance: f64, fetched_at: i64) -> Self {
        let market_cap = price * FALLBACK_SUPPLY;
        Self {
            price: Some(price),
            change_24h: Some(FALLBACK_CHANGE_24H),
            market_cap: Some(market_cap),
            volume_24h: Some(market_cap * FALLBACK_VOLUME_RATIO),
            supply: Some(FALLBACK_SUPPLY),
            dominance: Some(dominance),
            fetched_at,
        }
    }

    pub fn stats(&self) -> MarketStats {
        let or_unavailable = |v: Option<f64>, f: fn(f64) -> String| {
            v.map(f).unwrap_or_else(|| UNAVAILABLE.to_string())
        };
        MarketStats {
            market_cap: or_unavailable(self.market_cap, num::billions_usd),
            volume_24h: or_unavailable(self.volume_24h, num::billions_usd),
            dominance: or_unavailable(self.dominance, num::percent),
            supply: or_unavailable(self.supply, num::millions_btc),
        }
    }
}

/// A random price within a thousand dollars of 37,000.
pub fn plausible_price(rng: &mut impl Rng) -> f64 {
    PLAUSIBLE_PRICE + rng.gen_range(-1000.0..1000.0)
}

// ─── Balance card ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCard {
    /// Holding in BTC, four decimals.
    pub btc: String,
    /// USD value with thousands separators, or a waiting notice.
    pub usd: String,
}

pub fn balance_card(balance_btc: f64, price: Option<f64>) -> BalanceCard {
    let usd = match price {
        Some(p) if p > 0.0 => num::with_thousands(balance_btc * p, 2),
        _ => "Waiting for price.".to_string(),
    };
    BalanceCard {
        btc: format!("{:.4}", balance_btc),
        usd,
    }
}

// ─── Demo transactions ───────────────────────────────────────────────────────

/// Time labels of the three demo transactions: half an hour ago, yesterday
/// at 9:47 AM and three days ago at 10:18 PM.
pub fn transaction_times(now_local: NaiveDateTime) -> [String; 3] {
    let at = |days_back: i64, h: u32, m: u32| {
        (now_local - ChronoDuration::milliseconds(days_back * DAY_MS))
            .date()
            .and_hms_opt(h, m, 0)
            .map(|t| time::clock_label_naive(&t))
            .unwrap_or_default()
    };
    [
        time::clock_label_naive(&(now_local - ChronoDuration::milliseconds(30 * MINUTE_MS))),
        at(1, 9, 47),
        at(3, 22, 18),
    ]
}
