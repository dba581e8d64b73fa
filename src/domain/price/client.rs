//! Prices sub-client: REST poll, stream ticks, realtime pause.

use crate::client::DashboardClient;
use crate::domain::price::{PriceSample, PriceSource, PriceUpdate};
use crate::http::reached_server;
use crate::rate_limit::COINCAP;
use crate::shared::now_ms;
use crate::state::LiveEffect;

/// Result of a REST price poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceFetch {
    Updated {
        update: PriceUpdate,
        live: Option<LiveEffect>,
    },
    /// Paused, or the last update is too recent.
    Skipped,
    /// The local CoinCap budget is spent.
    RateLimited,
    Unavailable(String),
}

/// Sub-client for the BTC price.
pub struct Prices<'a> {
    pub(crate) client: &'a DashboardClient,
}

impl<'a> Prices<'a> {
    /// Poll CoinCap for the current price.
    ///
    /// The state lock is released for the duration of the request.
    pub async fn fetch_live(&self) -> PriceFetch {
        {
            let state = self.client.state.lock().await;
            let now = now_ms();
            if !state.ticker.should_poll(now) {
                return PriceFetch::Skipped;
            }
            if !state.limiter.can_call(COINCAP, now) {
                tracing::debug!("price poll skipped: rate limited");
                return PriceFetch::RateLimited;
            }
        }

        let result = self.client.http.get_asset().await;

        let now = now_ms();
        let mut state = self.client.state.lock().await;
        if reached_server(&result) {
            state.limiter.record_call(COINCAP, now);
            state.ticker.mark_polled(now);
        }
        let sample = match result.and_then(|r| r.into_sample(now)) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(error = %e, "price poll failed");
                return PriceFetch::Unavailable(e.to_string());
            }
        };

        let update = state.ticker.apply(sample.price, now, PriceSource::Poll);
        state.cache.put_price(sample, now);
        let live = state.apply_live_price(sample.price, now);
        PriceFetch::Updated { update, live }
    }

    /// Offer a streamed price. `None` when throttled or paused.
    pub async fn accept_tick(&self, price: f64) -> Option<(PriceUpdate, Option<LiveEffect>)> {
        let now = now_ms();
        let mut state = self.client.state.lock().await;
        let update = state.ticker.offer_tick(price, now)?;
        state.cache.put_price(update.sample, now);
        let live = state.apply_live_price(price, now);
        Some((update, live))
    }

    pub async fn current(&self) -> Option<PriceSample> {
        self.client.state.lock().await.ticker.current()
    }

    pub async fn pause(&self) {
        self.client.state.lock().await.ticker.pause();
    }

    pub async fn resume_realtime(&self) {
        self.client.state.lock().await.ticker.resume();
    }

    pub async fn is_paused(&self) -> bool {
        self.client.state.lock().await.ticker.is_paused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Period;

    fn offline_client() -> DashboardClient {
        DashboardClient::builder()
            .coincap_url("http://127.0.0.1:9")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_accept_tick_throttles() {
        let client = offline_client();
        let (first, _) = client.prices().accept_tick(67_000.0).await.unwrap();
        assert_eq!(first.previous, None);
        assert_eq!(first.source, PriceSource::Stream);
        assert!(client.prices().accept_tick(67_010.0).await.is_none());
        assert_eq!(client.prices().current().await.unwrap().price, 67_000.0);
    }

    #[tokio::test]
    async fn test_paused_feed_drops_ticks_and_skips_polls() {
        let client = offline_client();
        client.prices().pause().await;
        assert!(client.prices().accept_tick(1.0).await.is_none());
        assert_eq!(client.prices().fetch_live().await, PriceFetch::Skipped);
        client.prices().resume_realtime().await;
        assert!(!client.prices().is_paused().await);
    }

    #[tokio::test]
    async fn test_rate_limited_poll_makes_no_request() {
        let client = offline_client();
        {
            let mut state = client.state.lock().await;
            let now = now_ms();
            for _ in 0..client.config().rate_limit.per_minute {
                state.limiter.record_call(COINCAP, now);
            }
        }
        assert_eq!(client.prices().fetch_live().await, PriceFetch::RateLimited);
    }

    #[tokio::test]
    async fn test_unreachable_poll_is_unavailable_and_not_counted() {
        let client = offline_client();
        assert!(matches!(
            client.prices().fetch_live().await,
            PriceFetch::Unavailable(_)
        ));
        let state = client.state.lock().await;
        assert_eq!(state.limiter.calls_within(COINCAP, 60_000, now_ms()), 0);
        assert!(state.ticker.current().is_none());
        assert_eq!(state.active_period(), Period::Hours12);
    }
}
