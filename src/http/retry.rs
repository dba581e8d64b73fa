//! Retry policies for HTTP requests.
//!
//! CoinCap requests default to [`RetryPolicy::None`]: every attempt counts
//! against the client-side rate budget, so the engine decides when to try
//! again. CoinGecko is unmetered and retries idempotently.

use crate::error::HttpError;
use crate::shared::serde_util::duration_ms;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for an HTTP request.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Single attempt. Used for metered and non-idempotent endpoints.
    #[default]
    None,
    /// Retry on transport failures and 502/503/504, honoring 429.
    Idempotent,
    /// User-provided retry logic.
    Custom(RetryConfig),
}

impl RetryPolicy {
    /// The effective config, or `None` for a single attempt.
    pub fn config(&self) -> Option<RetryConfig> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Idempotent => Some(RetryConfig::idempotent()),
            RetryPolicy::Custom(c) => Some(c.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial request.
    pub max_retries: u32,
    #[serde(with = "duration_ms")]
    pub initial_delay: Duration,
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Spread each delay by up to a quarter in either direction.
    pub jitter: bool,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
            backoff_factor: 2.0,
            jitter: true,
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn idempotent() -> Self {
        Self {
            retryable_statuses: vec![429, 502, 503, 504],
            ..Self::default()
        }
    }

    /// Whether `error` is worth another attempt under this config.
    pub fn should_retry(&self, error: &HttpError) -> bool {
        match error {
            HttpError::ServerError { status, .. } => self.retryable_statuses.contains(status),
            HttpError::RateLimited { .. } => self.retryable_statuses.contains(&429),
            HttpError::Timeout => true,
            #[cfg(feature = "http")]
            HttpError::Reqwest(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.delay_for_attempt_with(attempt, &mut rand::thread_rng())
    }

    pub fn delay_for_attempt_with(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let base = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let spread = capped * 0.25;
            (capped + rng.gen_range(-spread..=spread)).max(0.0)
        } else {
            capped
        };
        Duration::from_millis(final_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed(initial_ms: u64, max_ms: u64, factor: f64) -> RetryConfig {
        RetryConfig {
            max_retries: 5,
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
            backoff_factor: factor,
            jitter: false,
            retryable_statuses: vec![],
        }
    }

    #[test]
    fn test_default_policy_is_single_attempt() {
        assert!(RetryPolicy::default().config().is_none());
        assert!(RetryPolicy::Idempotent.config().is_some());
    }

    #[test]
    fn test_idempotent_retries_rate_limits_and_gateway_errors() {
        let config = RetryConfig::idempotent();
        assert!(config.should_retry(&HttpError::RateLimited { retry_after_ms: None }));
        assert!(config.should_retry(&HttpError::ServerError {
            status: 503,
            body: String::new()
        }));
        assert!(!config.should_retry(&HttpError::ServerError {
            status: 500,
            body: String::new()
        }));
        assert!(!config.should_retry(&HttpError::Unauthorized));
        assert!(!RetryConfig::default().should_retry(&HttpError::RateLimited { retry_after_ms: None }));
    }

    #[test]
    fn test_delay_doubles() {
        let config = fixed(100, 10_000, 2.0);
        let delays: Vec<u128> = (0..3).map(|a| config.delay_for_attempt(a).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400]);
    }

    #[test]
    fn test_delay_caps_at_max() {
        let config = fixed(1000, 2000, 10.0);
        assert_eq!(config.delay_for_attempt(3).as_millis(), 2000);
    }

    #[test]
    fn test_jitter_stays_within_a_quarter() {
        let config = RetryConfig {
            jitter: true,
            ..fixed(1000, 60_000, 1.0)
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let ms = config.delay_for_attempt_with(0, &mut rng).as_millis();
            assert!((750..=1250).contains(&ms));
        }
    }

    #[test]
    fn test_config_from_json() {
        let config: RetryConfig =
            serde_json::from_str(r#"{"max_retries":1,"initial_delay":50,"jitter":false}"#).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.initial_delay, Duration::from_millis(50));
        assert_eq!(config.retryable_statuses, vec![502, 503, 504]);
    }
}
