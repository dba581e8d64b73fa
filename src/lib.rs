//! # stardash
//!
//! Starfield pages, a live BTC price dashboard and the client side of a
//! password-gated school portal.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Periods, formatting, domain models, rate limiter, TTL cache (always available)
//! 2. **Pages**: Starfield, navigation and the school view model (no network)
//! 3. **Auth**: Token storage and the session guard; the gate itself needs `http`
//! 4. **HTTP API**: `DashHttp` with per-endpoint retry policies
//! 5. **WebSocket**: CryptoCompare price stream on `tokio-tungstenite`
//! 6. **High-Level Client**: `DashboardClient` with nested sub-clients and shared state
//! 7. **Runtime**: Keyed tokio scheduler and the `Dashboard` engine emitting view updates
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stardash::prelude::*;
//! use futures_util::StreamExt;
//!
//! let client = DashboardClient::builder().build()?;
//! let (dashboard, mut updates) = Dashboard::start(client, PageOptions::default()).await?;
//!
//! dashboard.select_period(Period::Days7).await;
//! while let Some(update) = updates.next().await {
//!     render(update);
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared types: chart periods, clock helpers, number and time formatting.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified error types.
pub mod error;

/// Upstream URLs and page paths.
pub mod network;

/// Tunable intervals, TTLs and budgets.
pub mod config;

/// Sliding-window request budget per API.
pub mod rate_limit;

/// Keyed TTL cache for charts, the summary and the last price.
pub mod cache;

/// Shared mutable state of one dashboard page.
pub mod state;

// ── Layer 2: Pages ───────────────────────────────────────────────────────────

/// Starfield, page transitions and the school dashboard.
pub mod page;

// ── Layer 3: Auth ────────────────────────────────────────────────────────────

/// Password gate, token storage and session guard.
pub mod auth;

// ── Layer 4: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 5: WebSocket ───────────────────────────────────────────────────────

/// WebSocket client: messages, subscriptions, events.
pub mod ws;

// ── Layer 6: High-Level Client ───────────────────────────────────────────────

/// `DashboardClient`, the primary entry point.
#[cfg(feature = "http")]
pub mod client;

/// Typed updates for a renderer.
#[cfg(feature = "http")]
pub mod view;

// ── Layer 7: Runtime ─────────────────────────────────────────────────────────

/// Keyed, cancellable tokio tasks.
#[cfg(feature = "runtime")]
pub mod scheduler;

/// The running BTC dashboard.
#[cfg(feature = "runtime")]
pub mod engine;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared types
    pub use crate::shared::{now_ms, Period};

    // Domain types: price
    pub use crate::domain::price::{
        PriceDirection, PriceSample, PriceSource, PriceTicker, PriceUpdate,
    };

    // Domain types: chart
    pub use crate::domain::chart::{
        ChartSeries, HistoryPoint, PeriodSwitcher, PriceRange, RealtimeSeries, RequestFence,
        SwitchDecision,
    };

    // Domain types: market
    pub use crate::domain::market::{BalanceCard, MarketStats, MarketSummary, SummarySource};

    // Errors
    pub use crate::error::{AuthError, DashError, HttpError, WsError};

    // Network
    pub use crate::network::{pages, Endpoints};

    // Config, cache, limiter, state
    pub use crate::cache::{CacheKey, TtlCache};
    pub use crate::config::DashboardConfig;
    pub use crate::rate_limit::RateLimiter;
    pub use crate::state::{DashboardState, FeedStatus, LiveEffect};

    // Pages
    pub use crate::page::navigation::{Effect, Step};
    pub use crate::page::school::Assignment;
    pub use crate::page::{
        NavAction, NavOption, NavigationController, Page, PageProfile, SchoolDashboard,
        ShootingStar, Starfield, Viewport,
    };

    // Auth
    pub use crate::auth::{
        FileStore, GuardState, MemoryStore, RejectReason, Rejection, SessionGuard, TokenStore,
    };

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        AuthClient, ChartsClient, DashboardClient, DashboardClientBuilder, MarketClient,
        PricesClient,
    };
    #[cfg(feature = "http")]
    pub use crate::domain::chart::client::ChartLoad;
    #[cfg(feature = "http")]
    pub use crate::domain::price::client::PriceFetch;
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
    #[cfg(feature = "http")]
    pub use crate::view::ViewUpdate;

    // WebSocket types
    pub use crate::ws::{Kind, MessageIn, MessageOut, Subscription, WsConfig, WsEvent};
    #[cfg(feature = "ws-native")]
    pub use crate::ws::native::WsClient;

    // Runtime
    #[cfg(feature = "runtime")]
    pub use crate::engine::{Dashboard, PageOptions, ViewStream};
    #[cfg(feature = "runtime")]
    pub use crate::scheduler::{Scheduler, TaskKey};
}
