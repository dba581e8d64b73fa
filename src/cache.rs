//! Keyed TTL cache for chart series, the market summary and the last price.
//!
//! Reads never check age: [`TtlCache::get`] returns stale payloads so callers
//! can fall back on them. Freshness is asked separately with
//! [`TtlCache::is_valid`], and expired entries leave only on [`TtlCache::sweep`].

use crate::config::{ms, CacheConfig};
use crate::domain::chart::ChartSeries;
use crate::domain::market::MarketSummary;
use crate::domain::price::PriceSample;
use crate::shared::Period;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Chart(Period),
    Dashboard,
    Price,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Chart(p) => write!(f, "chart:{}", p),
            CacheKey::Dashboard => f.write_str("dashboard"),
            CacheKey::Price => f.write_str("price:btc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachePayload {
    Chart(ChartSeries),
    Dashboard(MarketSummary),
    Price(PriceSample),
}

#[derive(Debug, Clone)]
struct Entry {
    payload: CachePayload,
    written_at: i64,
}

#[derive(Debug, Clone)]
pub struct TtlCache {
    entries: HashMap<CacheKey, Entry>,
    ttls: CacheConfig,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl TtlCache {
    pub fn new(ttls: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            ttls,
        }
    }

    /// Store `payload` under `key`, stamped `now_ms`.
    pub fn insert(&mut self, key: CacheKey, payload: CachePayload, now_ms: i64) {
        self.entries.insert(
            key,
            Entry {
                payload,
                written_at: now_ms,
            },
        );
    }

    /// Payload for `key` regardless of age.
    pub fn get(&self, key: &CacheKey) -> Option<&CachePayload> {
        self.entries.get(key).map(|e| &e.payload)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Age of the entry at `now_ms`.
    pub fn age(&self, key: &CacheKey, now_ms: i64) -> Option<i64> {
        self.entries.get(key).map(|e| now_ms - e.written_at)
    }

    /// Entry exists and is strictly younger than `max_age_ms`.
    pub fn is_valid(&self, key: &CacheKey, max_age_ms: i64, now_ms: i64) -> bool {
        self.age(key, now_ms).is_some_and(|age| age < max_age_ms)
    }

    /// TTL of the class `key` belongs to.
    pub fn ttl_for(&self, key: &CacheKey) -> i64 {
        match key {
            CacheKey::Chart(_) => ms(self.ttls.chart_ttl),
            CacheKey::Dashboard => ms(self.ttls.dashboard_ttl),
            CacheKey::Price => ms(self.ttls.default_ttl),
        }
    }

    /// Remove every entry older than its class TTL. Returns the removed keys.
    pub fn sweep(&mut self, now_ms: i64) -> Vec<CacheKey> {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(k, e)| now_ms - e.written_at > self.ttl_for(k))
            .map(|(k, _)| *k)
            .collect();
        for key in &expired {
            self.entries.remove(key);
            tracing::debug!(key = %key, "cache entry expired");
        }
        expired
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<CachePayload> {
        self.entries.remove(key).map(|e| e.payload)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Typed accessors ──────────────────────────────────────────────────

    pub fn chart(&self, period: Period) -> Option<&ChartSeries> {
        match self.get(&CacheKey::Chart(period)) {
            Some(CachePayload::Chart(s)) => Some(s),
            _ => None,
        }
    }

    pub fn dashboard(&self) -> Option<&MarketSummary> {
        match self.get(&CacheKey::Dashboard) {
            Some(CachePayload::Dashboard(d)) => Some(d),
            _ => None,
        }
    }

    pub fn price(&self) -> Option<&PriceSample> {
        match self.get(&CacheKey::Price) {
            Some(CachePayload::Price(p)) => Some(p),
            _ => None,
        }
    }

    pub fn put_chart(&mut self, series: ChartSeries, now_ms: i64) {
        self.insert(CacheKey::Chart(series.period), CachePayload::Chart(series), now_ms);
    }

    pub fn put_dashboard(&mut self, summary: MarketSummary, now_ms: i64) {
        self.insert(CacheKey::Dashboard, CachePayload::Dashboard(summary), now_ms);
    }

    pub fn put_price(&mut self, sample: PriceSample, now_ms: i64) {
        self.insert(CacheKey::Price, CachePayload::Price(sample), now_ms);
    }
}
