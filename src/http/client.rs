//! Low-level HTTP client: `DashHttp`.
//!
//! One method per upstream endpoint, returning wire types. Conversion to
//! domain types and every fallback decision happen in the sub-clients.

use crate::auth::{AuthenticateRequest, AuthenticateResponse, VerifyRequest, VerifyResponse};
use crate::domain::chart::wire::HistoryResponse;
use crate::domain::market::wire::GlobalResponse;
use crate::domain::price::wire::AssetResponse;
use crate::error::HttpError;
use crate::http::retry::RetryPolicy;
use crate::network::Endpoints;
use crate::shared::Period;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Low-level HTTP client for CoinCap, CoinGecko and the auth backend.
#[derive(Clone)]
pub struct DashHttp {
    endpoints: Endpoints,
    client: Client,
}

impl DashHttp {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self {
            endpoints: endpoints.normalized(),
            client,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ── CoinCap ──────────────────────────────────────────────────────────

    pub async fn get_asset(&self) -> Result<AssetResponse, HttpError> {
        let url = format!("{}/v2/assets/bitcoin", self.endpoints.coincap);
        self.get(&url, RetryPolicy::None).await
    }

    pub async fn get_history(
        &self,
        period: Period,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<HistoryResponse, HttpError> {
        let url = format!(
            "{}/v2/assets/bitcoin/history?interval={}&start={}&end={}",
            self.endpoints.coincap,
            period.interval(),
            start_ms,
            end_ms
        );
        self.get(&url, RetryPolicy::None).await
    }

    // ── CoinGecko ────────────────────────────────────────────────────────

    pub async fn get_global(&self) -> Result<GlobalResponse, HttpError> {
        let url = format!("{}/api/v3/global", self.endpoints.coingecko);
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Auth backend ─────────────────────────────────────────────────────

    /// Nudge the backend out of a cold start. The body is ignored.
    pub async fn wake_up(&self) -> Result<(), HttpError> {
        let url = format!("{}/api/wake-up", self.endpoints.auth);
        let _: serde_json::Value = self.get(&url, RetryPolicy::None).await?;
        Ok(())
    }

    pub async fn school_authenticate(
        &self,
        request: &AuthenticateRequest,
    ) -> Result<AuthenticateResponse, HttpError> {
        let url = format!("{}/api/school-authenticate", self.endpoints.auth);
        self.post(&url, request, None, RetryPolicy::None).await
    }

    pub async fn verify_session(&self, token: &str) -> Result<VerifyResponse, HttpError> {
        let url = format!("{}/api/verify-session", self.endpoints.auth);
        let body = VerifyRequest {
            token: token.to_string(),
        };
        self.post(&url, &body, Some(token), RetryPolicy::None).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str, retry: RetryPolicy) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::GET, url, None::<&()>, None, retry)
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        bearer: Option<&str>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::POST, url, Some(body), bearer, retry)
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        bearer: Option<&str>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let Some(config) = retry.config() else {
            return self.do_request(&method, url, body, bearer).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T, B>(&method, url, body, bearer).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if !config.should_retry(&e) || attempt >= config.max_retries {
                        return Err(e);
                    }
                    let delay = match &e {
                        HttpError::RateLimited {
                            retry_after_ms: Some(ms),
                        } => Duration::from_millis(*ms),
                        _ => config.delay_for_attempt(attempt),
                    };
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying request to {}",
                        url
                    );
                    futures_timer::Delay::new(delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<T, HttpError> {
        let mut req = self.client.request(method.clone(), url);

        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Reqwest(e)
            }
        })?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<T>().await?;
            return Ok(parsed);
        }

        let status_code = status.as_u16();
        let retry_after_ms = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let body_text = resp.text().await.unwrap_or_default();

        tracing::debug!(status = status_code, "{} {} failed", method, url);

        Err(status_error(status_code, body_text, retry_after_ms))
    }
}

/// Map a non-2xx status to an error.
fn status_error(status: u16, body: String, retry_after_ms: Option<u64>) -> HttpError {
    match status {
        401 => HttpError::Unauthorized,
        403 => HttpError::Forbidden,
        404 => HttpError::NotFound(body),
        429 => HttpError::RateLimited { retry_after_ms },
        400..=499 => HttpError::BadRequest(body),
        _ => HttpError::ServerError { status, body },
    }
}
