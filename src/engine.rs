//! BTC dashboard runtime.
//!
//! [`Dashboard::start`] wires a [`DashboardClient`] to a tokio scheduler and
//! the price socket, and returns a stream of [`ViewUpdate`]s. Every timer of
//! the page is a keyed task, so leaving the page is one `cancel_all`.
//!
//! Scheduled jobs hold a weak reference to the engine. Dropping every
//! [`Dashboard`] handle drops the scheduler, which aborts the jobs.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures_util::stream::{Stream, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use crate::client::DashboardClient;
use crate::config::ms;
use crate::domain::chart::client::ChartLoad;
use crate::domain::chart::SwitchDecision;
use crate::domain::price::client::PriceFetch;
use crate::domain::price::PriceUpdate;
use crate::error::DashError;
use crate::page::starfield::{self, PageProfile, Viewport, SHOOTING_STAR_INTERVAL, STAR_COUNT};
use crate::scheduler::{Scheduler, TaskKey};
use crate::shared::{now_ms, Period};
use crate::state::LiveEffect;
use crate::view::{self, ViewUpdate};
use crate::ws::native::WsClient;
use crate::ws::WsEvent;

/// View updates, in emission order.
pub type ViewStream = Pin<Box<dyn Stream<Item = ViewUpdate> + Send>>;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Page options known at start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageOptions {
    pub viewport: Viewport,
    /// Visitor came back from another page; stars fade in sooner.
    pub returning: bool,
    /// Open the price socket. Off for offline rendering and tests.
    pub live_feed: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            returning: false,
            live_feed: true,
        }
    }
}

struct Inner {
    client: DashboardClient,
    scheduler: Arc<Scheduler<TaskKey>>,
    tx: mpsc::UnboundedSender<ViewUpdate>,
    viewport: Mutex<Viewport>,
    returning: bool,
    rng: Mutex<StdRng>,
}

/// Handle to a running dashboard page. Clones share the page.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

impl Dashboard {
    /// Start the page: background stars, the first price poll, summary and
    /// 12h chart load, every periodic refresh and the price socket.
    pub async fn start(
        client: DashboardClient,
        options: PageOptions,
    ) -> Result<(Self, ViewStream), DashError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            client,
            scheduler: Scheduler::new(),
            tx,
            viewport: Mutex::new(options.viewport),
            returning: options.returning,
            rng: Mutex::new(StdRng::from_entropy()),
        });

        inner.emit(ViewUpdate::Stars(inner.with_rng(|rng| {
            starfield::create_stars(STAR_COUNT, options.returning, PageProfile::Btc, rng)
        })));
        inner.emit(ViewUpdate::Transactions(inner.client.market().transactions()));
        let period = inner.client.charts().active().await.0;
        inner.emit(ViewUpdate::ActivePeriod(period));
        inner.emit(view::chart_header(period));

        let config = inner.client.config().clone();
        every(&inner, TaskKey::PricePoll, Duration::ZERO, config.price_poll_interval, poll_price);
        every(
            &inner,
            TaskKey::DashboardRefresh,
            Duration::ZERO,
            config.dashboard_refresh_interval,
            refresh_summary,
        );
        every(
            &inner,
            TaskKey::ChartRefresh,
            config.chart_refresh_interval,
            config.chart_refresh_interval,
            refresh_chart,
        );
        every(
            &inner,
            TaskKey::CacheSweep,
            config.cache.sweep_interval,
            config.cache.sweep_interval,
            sweep_cache,
        );
        every(
            &inner,
            TaskKey::ShootingStars,
            SHOOTING_STAR_INTERVAL,
            SHOOTING_STAR_INTERVAL,
            shooting_star,
        );
        schedule_load(&inner, TaskKey::PeriodSwitch, Duration::ZERO, period, false);

        if options.live_feed {
            let mut ws = inner.client.ws_native();
            ws.connect().await?;
            inner
                .scheduler
                .spawn(TaskKey::PriceFeed, run_price_feed(Arc::downgrade(&inner), ws));
        }
        tracing::info!("dashboard started");

        let stream = async_stream::stream! {
            while let Some(update) = rx.recv().await {
                yield update;
            }
        };
        Ok((Self { inner }, Box::pin(stream)))
    }

    pub fn client(&self) -> &DashboardClient {
        &self.inner.client
    }

    /// Switch the chart period.
    ///
    /// Pending retries of the old and new period and any deferred switch are
    /// cancelled, and in-flight loads are fenced off.
    pub async fn select_period(&self, period: Period) -> SwitchDecision {
        let inner = &self.inner;
        let (previous, decision) = {
            let mut state = inner.client.state.lock().await;
            let now = now_ms();
            let previous = state.active_period();
            let age = state.chart_cache_age(period, now);
            let decision = state.switcher.select(period, age, now);
            if decision != SwitchDecision::Unchanged {
                state.fence.invalidate();
            }
            (previous, decision)
        };
        if decision == SwitchDecision::Unchanged {
            return decision;
        }

        inner.scheduler.cancel(&TaskKey::ChartRetry(previous));
        inner.scheduler.cancel(&TaskKey::ChartRetry(period));
        inner.scheduler.cancel(&TaskKey::PeriodSwitch);
        inner.emit(ViewUpdate::ActivePeriod(period));
        inner.emit(view::chart_header(period));

        match decision {
            SwitchDecision::Defer { delay_ms } => {
                let delay = Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0));
                tracing::debug!(%period, delay_ms, "period switch deferred");
                schedule_load(inner, TaskKey::PeriodSwitch, delay, period, true);
            }
            _ => schedule_load(inner, TaskKey::PeriodSwitch, Duration::ZERO, period, false),
        }
        decision
    }

    /// New viewport size for shooting stars.
    pub fn resize(&self, viewport: Viewport) {
        *self
            .inner
            .viewport
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = viewport;
    }

    /// Tasks currently scheduled.
    pub fn pending_tasks(&self) -> Vec<TaskKey> {
        self.inner.scheduler.pending()
    }

    /// Leave the page: cancel every task, close the socket and drop the
    /// accumulated state.
    pub async fn shutdown(&self) {
        self.inner.scheduler.cancel_all();
        self.inner.client.reset_state().await;
        tracing::info!("dashboard stopped");
    }
}

impl Inner {
    fn emit(&self, update: ViewUpdate) {
        let _ = self.tx.send(update);
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn emit_price(&self, update: &PriceUpdate, live: Option<LiveEffect>) {
        let balance = self.client.market().balance().await;
        for u in view::price_updates(update, self.client.config(), balance) {
            self.emit(u);
        }
        if let Some(effect) = live {
            self.emit(view::live_chart(effect));
        }
    }
}

// ─── Scheduling helpers ──────────────────────────────────────────────────────

fn every(inner: &Arc<Inner>, key: TaskKey, first: Duration, period: Duration, job: fn(Arc<Inner>) -> Job) {
    let weak = Arc::downgrade(inner);
    inner.scheduler.every(key, first, period, move || {
        let weak = weak.clone();
        async move {
            if let Some(inner) = weak.upgrade() {
                job(inner).await;
            }
        }
    });
}

fn schedule_load(inner: &Arc<Inner>, key: TaskKey, delay: Duration, period: Period, mark_started: bool) {
    let weak = Arc::downgrade(inner);
    inner.scheduler.after(key, delay, async move {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if mark_started {
            inner.client.state.lock().await.switcher.mark_load_started(now_ms());
        }
        load_chart(inner, period).await;
    });
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

fn poll_price(inner: Arc<Inner>) -> Job {
    Box::pin(async move {
        let prices = inner.client.prices();
        match prices.fetch_live().await {
            PriceFetch::Updated { update, live } => inner.emit_price(&update, live).await,
            other => {
                let has_price = prices.current().await.is_some();
                if let Some(notice) = view::price_notice(&other, has_price, inner.client.config()) {
                    inner.emit(notice);
                }
            }
        }
    })
}

fn refresh_summary(inner: Arc<Inner>) -> Job {
    Box::pin(async move {
        let market = inner.client.market();
        let outcome = market.summary().await;
        let balance = market.balance().await;
        for u in view::summary_updates(&outcome, inner.client.config(), balance) {
            inner.emit(u);
        }
    })
}

/// Reload the active period when its cache has aged past the refresh
/// interval and no load is running.
fn refresh_chart(inner: Arc<Inner>) -> Job {
    Box::pin(async move {
        if inner.client.prices().is_paused().await {
            return;
        }
        let (period, age) = inner.client.charts().active().await;
        let interval = ms(inner.client.config().chart_refresh_interval);
        if age.is_some_and(|age| age < interval) {
            return;
        }
        load_chart(inner, period).await;
    })
}

fn sweep_cache(inner: Arc<Inner>) -> Job {
    Box::pin(async move {
        let removed = inner.client.state.lock().await.cache.sweep(now_ms());
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "swept cache");
        }
    })
}

fn shooting_star(inner: Arc<Inner>) -> Job {
    Box::pin(async move {
        let viewport = inner.viewport();
        let star =
            inner.with_rng(|rng| starfield::spawn_shooting_star(viewport, inner.returning, rng));
        if let Some(star) = star {
            inner.emit(ViewUpdate::ShootingStar(star));
        }
    })
}

/// Load `period`, draw the outcome and schedule its retry or resume.
fn load_chart(inner: Arc<Inner>, period: Period) -> Job {
    Box::pin(async move {
        inner.scheduler.cancel(&TaskKey::ResumeRealtime);
        inner.emit(ViewUpdate::ChartLoading(true));

        let load = inner.client.charts().load(period).await;
        let config = inner.client.config();
        if !matches!(load, ChartLoad::Superseded { .. }) {
            inner.scheduler.cancel(&TaskKey::ChartRetry(period));
        }

        if let Some(delay) = load.retry_after(config) {
            tracing::debug!(%period, delay_ms = ms(delay), "chart retry scheduled");
            let weak = Arc::downgrade(&inner);
            inner.scheduler.after(TaskKey::ChartRetry(period), delay, async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.client.charts().active().await.0 == period {
                    load_chart(inner, period).await;
                }
            });
        }
        if let Some(delay) = load.resume_after(config) {
            let weak = Arc::downgrade(&inner);
            inner.scheduler.after(TaskKey::ResumeRealtime, delay, async move {
                if let Some(inner) = weak.upgrade() {
                    inner.client.prices().resume_realtime().await;
                }
            });
        }
        for u in view::chart_load_updates(&load, config) {
            inner.emit(u);
        }
    })
}

// ─── Price feed ──────────────────────────────────────────────────────────────

async fn run_price_feed(weak: Weak<Inner>, ws: WsClient) {
    let mut events = ws.events();
    while let Some(event) = events.next().await {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        on_ws_event(&inner, event).await;
    }
}

async fn on_ws_event(inner: &Arc<Inner>, event: WsEvent) {
    match event {
        WsEvent::Message(kind) => {
            let Some(price) = kind.btc_usd_price() else {
                return;
            };
            if let Some((update, live)) = inner.client.prices().accept_tick(price).await {
                inner.emit_price(&update, live).await;
            }
        }
        WsEvent::Connected => {
            let feed = {
                let mut state = inner.client.state.lock().await;
                if state.feed.open() {
                    inner.scheduler.cancel(&TaskKey::FallbackPoll);
                    tracing::info!("price stream restored, fallback polling stopped");
                }
                state.feed
            };
            inner.emit(ViewUpdate::Feed(feed));
        }
        WsEvent::ReconnectScheduled { attempt, delay_ms } => {
            tracing::info!(attempt, delay_ms, "price stream reconnect scheduled");
        }
        outage => {
            let (start, feed) = {
                let mut state = inner.client.state.lock().await;
                (state.feed.outage(), state.feed)
            };
            if start {
                tracing::warn!(event = ?outage, "price stream down, polling instead");
                let interval = inner.client.config().fallback_poll_interval;
                every(inner, TaskKey::FallbackPoll, interval, interval, poll_price);
            }
            inner.emit(ViewUpdate::Feed(feed));
        }
    }
}
