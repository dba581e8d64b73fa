//! Market sub-client: dashboard summary with its fallback chain, balance
//! card and demo transactions.

use crate::cache::CacheKey;
use crate::client::DashboardClient;
use crate::config::ms;
use crate::domain::market::{
    self, balance_card, transaction_times, BalanceCard, MarketSummary, SummarySource,
};
use crate::domain::price::{PriceSource, PriceUpdate};
use crate::error::HttpError;
use crate::http::reached_server;
use crate::rate_limit::COINCAP;
use crate::shared::now_ms;

/// Outcome of [`Market::summary`]. A summary is always produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    pub summary: MarketSummary,
    pub source: SummarySource,
    /// Set when the summary put the first price on the ticker, fetched or
    /// invented.
    pub price_update: Option<PriceUpdate>,
}

impl SummaryOutcome {
    fn new(summary: MarketSummary, source: SummarySource) -> Self {
        Self {
            summary,
            source,
            price_update: None,
        }
    }
}

/// Sub-client for market stats.
pub struct Market<'a> {
    pub(crate) client: &'a DashboardClient,
}

impl<'a> Market<'a> {
    /// Market summary, degrading through cache, stale cache and synthesized
    /// stats. Never fails.
    pub async fn summary(&self) -> SummaryOutcome {
        let config = &self.client.config;
        {
            let state = self.client.state.lock().await;
            let now = now_ms();
            if let Some(cached) = state.cache.dashboard() {
                let valid =
                    state
                        .cache
                        .is_valid(&CacheKey::Dashboard, ms(config.cache.dashboard_ttl), now);
                if valid || !state.limiter.can_call(COINCAP, now) {
                    tracing::debug!(valid, "dashboard summary served from cache");
                    return SummaryOutcome::new(cached.clone(), SummarySource::Cached);
                }
            }
        }

        let asset = self.client.http.get_asset().await;
        let dominance = match &asset {
            Ok(_) => self.dominance().await,
            Err(_) => config.dominance_fallback,
        };

        let now = now_ms();
        let mut state = self.client.state.lock().await;
        if reached_server(&asset) {
            state.limiter.record_call(COINCAP, now);
        }

        let data = asset.and_then(|r| {
            r.data
                .ok_or_else(|| HttpError::EmptyPayload("asset response has no data".into()))
        });
        match data {
            Ok(data) => {
                let mut summary = MarketSummary::from_asset(data, dominance, now);
                let price_update = match (state.ticker.price(), summary.price) {
                    (Some(live), _) => {
                        summary.price = Some(live);
                        None
                    }
                    (None, Some(fetched)) => Some(state.ticker.adopt(fetched, now)),
                    (None, None) => None,
                };
                state.cache.put_dashboard(summary.clone(), now);
                SummaryOutcome {
                    summary,
                    source: SummarySource::Fresh,
                    price_update,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "dashboard summary unavailable");
                if let Some(cached) = state.cache.dashboard() {
                    return SummaryOutcome::new(cached.clone(), SummarySource::Cached);
                }
                match state.ticker.price() {
                    Some(price) => SummaryOutcome::new(
                        MarketSummary::synthesized(price, config.dominance_fallback, now),
                        SummarySource::Synthesized,
                    ),
                    None => {
                        let price = market::plausible_price(&mut rand::thread_rng());
                        let update = state.ticker.apply(price, now, PriceSource::Synthesized);
                        SummaryOutcome {
                            summary: MarketSummary::synthesized(
                                price,
                                config.dominance_fallback,
                                now,
                            ),
                            source: SummarySource::Synthesized,
                            price_update: Some(update),
                        }
                    }
                }
            }
        }
    }

    /// BTC share of total market cap, or the configured fallback.
    pub async fn dominance(&self) -> f64 {
        match self.client.http.get_global().await {
            Ok(global) => global
                .btc_dominance()
                .unwrap_or(self.client.config.dominance_fallback),
            Err(e) => {
                tracing::warn!(error = %e, "dominance unavailable, using fallback");
                self.client.config.dominance_fallback
            }
        }
    }

    /// Demo balance valued at the current price.
    pub async fn balance(&self) -> BalanceCard {
        let price = self.client.state.lock().await.ticker.price();
        balance_card(self.client.config.demo_balance_btc, price)
    }

    /// Time labels of the demo transactions, in local time.
    pub fn transactions(&self) -> [String; 3] {
        transaction_times(chrono::Local::now().naive_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fixture::{asset_body, global_body, StubServer};
    use crate::view::{self, ViewUpdate};

    fn offline_client() -> DashboardClient {
        DashboardClient::builder()
            .coincap_url("http://127.0.0.1:9")
            .coingecko_url("http://127.0.0.1:9")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_cache_short_circuits() {
        let client = offline_client();
        let cached = MarketSummary::synthesized(50_000.0, 55.0, 0);
        client
            .state
            .lock()
            .await
            .cache
            .put_dashboard(cached.clone(), now_ms());
        let outcome = client.market().summary().await;
        assert_eq!(outcome.source, SummarySource::Cached);
        assert_eq!(outcome.summary, cached);
    }

    #[tokio::test]
    async fn test_stale_cache_after_failure() {
        let client = offline_client();
        let cached = MarketSummary::synthesized(50_000.0, 55.0, 0);
        client
            .state
            .lock()
            .await
            .cache
            .put_dashboard(cached.clone(), now_ms() - 6 * 60 * 1000);
        let outcome = client.market().summary().await;
        assert_eq!(outcome.source, SummarySource::Cached);
        assert_eq!(outcome.summary.dominance, Some(55.0));
    }

    #[tokio::test]
    async fn test_synthesized_from_known_price() {
        let client = offline_client();
        client.prices().accept_tick(40_000.0).await.unwrap();
        let outcome = client.market().summary().await;
        assert_eq!(outcome.source, SummarySource::Synthesized);
        assert_eq!(outcome.summary.price, Some(40_000.0));
        assert_eq!(outcome.summary.dominance, Some(60.5));
        assert!(outcome.price_update.is_none());
    }

    #[tokio::test]
    async fn test_plausible_price_is_pushed_to_ticker() {
        let client = offline_client();
        let outcome = client.market().summary().await;
        let update = outcome.price_update.unwrap();
        assert_eq!(update.source, PriceSource::Synthesized);
        assert!((36_000.0..38_000.0).contains(&update.sample.price));
        assert_eq!(
            client.prices().current().await.map(|s| s.price),
            Some(update.sample.price)
        );
    }

    #[tokio::test]
    async fn test_fresh_summary_sets_first_price_label() {
        let server = StubServer::start(vec![
            ("/v2/assets/bitcoin", vec![asset_body(65_000.5)]),
            ("/api/v3/global", vec![global_body(54.2)]),
        ])
        .await;
        let client = DashboardClient::builder()
            .coincap_url(server.url())
            .coingecko_url(server.url())
            .build()
            .unwrap();

        let outcome = client.market().summary().await;
        assert_eq!(outcome.source, SummarySource::Fresh);
        assert_eq!(outcome.summary.price, Some(65_000.5));
        assert_eq!(outcome.summary.dominance, Some(54.2));
        let update = outcome.price_update.clone().unwrap();
        assert_eq!(update.source, PriceSource::Poll);
        assert_eq!(update.previous, None);

        let balance = client.market().balance().await;
        let updates = view::summary_updates(&outcome, client.config(), balance);
        assert!(updates
            .iter()
            .any(|u| matches!(u, ViewUpdate::Price { text, .. } if text == "65000.50")));
        assert!(updates
            .iter()
            .any(|u| matches!(u, ViewUpdate::Balance(b) if b.usd == "56,914.44")));

        // The summary price does not throttle the first realtime tick.
        assert!(client.prices().accept_tick(65_010.0).await.is_some());
    }

    #[tokio::test]
    async fn test_fresh_summary_keeps_displayed_price() {
        let server = StubServer::start(vec![
            ("/v2/assets/bitcoin", vec![asset_body(65_000.5)]),
            ("/api/v3/global", vec![global_body(54.2)]),
        ])
        .await;
        let client = DashboardClient::builder()
            .coincap_url(server.url())
            .coingecko_url(server.url())
            .build()
            .unwrap();
        client.prices().accept_tick(64_000.0).await.unwrap();

        let outcome = client.market().summary().await;
        assert_eq!(outcome.source, SummarySource::Fresh);
        assert_eq!(outcome.summary.price, Some(64_000.0));
        assert!(outcome.price_update.is_none());
        assert_eq!(client.prices().current().await.map(|s| s.price), Some(64_000.0));
    }

    #[tokio::test]
    async fn test_balance_waits_for_price() {
        let client = offline_client();
        assert_eq!(client.market().balance().await.usd, "Waiting for price.");
        client.prices().accept_tick(10_000.0).await;
        assert_eq!(client.market().balance().await.usd, "8,756.00");
    }
}
