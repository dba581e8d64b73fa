//! High-level client: `DashboardClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the shared page state and the accessors.

use crate::auth::client::Auth;
use crate::auth::store::{MemoryStore, TokenStore};
use crate::config::DashboardConfig;
use crate::domain::chart::client::Charts;
use crate::domain::market::client::Market;
use crate::domain::price::client::Prices;
use crate::error::DashError;
use crate::http::DashHttp;
use crate::network::Endpoints;
use crate::state::DashboardState;
use crate::ws::WsConfig;

use async_lock::Mutex;
use std::sync::Arc;
use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::chart::client::Charts as ChartsClient;
pub use crate::domain::market::client::Market as MarketClient;
pub use crate::domain::price::client::Prices as PricesClient;

/// The primary entry point.
///
/// Cloning is cheap: clones share the HTTP pool, the page state and the
/// token store.
#[derive(Clone)]
pub struct DashboardClient {
    pub(crate) http: DashHttp,
    pub(crate) config: DashboardConfig,
    pub(crate) ws_config: WsConfig,
    /// Everything the dashboard page mutates. Never held across a request.
    pub(crate) state: Arc<Mutex<DashboardState>>,
    pub(crate) store: Arc<dyn TokenStore>,
}

impl DashboardClient {
    pub fn builder() -> DashboardClientBuilder {
        DashboardClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn prices(&self) -> Prices<'_> {
        Prices { client: self }
    }

    pub fn charts(&self) -> Charts<'_> {
        Charts { client: self }
    }

    pub fn market(&self) -> Market<'_> {
        Market { client: self }
    }

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    pub fn endpoints(&self) -> &Endpoints {
        self.http.endpoints()
    }

    /// Drop everything the page accumulated: limiter windows, cache, ticker,
    /// live series and period selection.
    pub async fn reset_state(&self) {
        *self.state.lock().await = DashboardState::new(&self.config);
    }

    /// Create a new native WS client from the current config.
    ///
    /// The socket is not embedded in the client; its lifetime belongs to
    /// whoever runs the page.
    #[cfg(feature = "ws-native")]
    pub fn ws_native(&self) -> crate::ws::native::WsClient {
        crate::ws::native::WsClient::new(self.ws_config.clone())
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct DashboardClientBuilder {
    endpoints: Endpoints,
    ws_config: WsConfig,
    config: DashboardConfig,
    timeout: Duration,
    store: Option<Arc<dyn TokenStore>>,
}

impl Default for DashboardClientBuilder {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            ws_config: WsConfig::default(),
            config: DashboardConfig::default(),
            timeout: Duration::from_secs(15),
            store: None,
        }
    }
}

impl DashboardClientBuilder {
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn coincap_url(mut self, url: &str) -> Self {
        self.endpoints.coincap = url.to_string();
        self
    }

    pub fn coingecko_url(mut self, url: &str) -> Self {
        self.endpoints.coingecko = url.to_string();
        self
    }

    pub fn auth_url(mut self, url: &str) -> Self {
        self.endpoints.auth = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_config.url = url.to_string();
        self
    }

    pub fn ws_config(mut self, ws_config: WsConfig) -> Self {
        self.ws_config = ws_config;
        self
    }

    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    /// Per-request HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where the session token lives. Defaults to memory.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<DashboardClient, DashError> {
        if self.timeout.is_zero() {
            return Err(DashError::Validation("timeout must be non-zero".into()));
        }
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn TokenStore>);
        Ok(DashboardClient {
            http: DashHttp::new(self.endpoints, self.timeout)?,
            state: Arc::new(Mutex::new(DashboardState::new(&self.config))),
            config: self.config,
            ws_config: self.ws_config,
            store,
        })
    }
}
