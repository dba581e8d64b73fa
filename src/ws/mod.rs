//! WebSocket layer for the CryptoCompare streamer: messages, subscriptions,
//! events and reconnect backoff.
//!
//! The transport lives in `native.rs` behind the `ws-native` feature. This
//! module only defines the wire frames and the event type the engine consumes.

pub mod subscriptions;

#[cfg(feature = "ws-native")]
pub mod native;

use serde::{Deserialize, Serialize};

pub use subscriptions::{Subscription, SubscriptionSet};

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action")]
pub enum MessageOut {
    SubAdd { subs: Vec<String> },
    SubRemove { subs: Vec<String> },
    Ping,
}

impl MessageOut {
    pub fn sub_add(subs: &[Subscription]) -> Self {
        MessageOut::SubAdd {
            subs: subs.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn sub_remove(subs: &[Subscription]) -> Self {
        MessageOut::SubRemove {
            subs: subs.iter().map(ToString::to_string).collect(),
        }
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Frame type codes used by the streamer.
pub mod frame_type {
    pub const TRADE: &str = "0";
    pub const SUBSCRIBE_COMPLETE: &str = "16";
    pub const WELCOME: &str = "20";
    pub const HEARTBEAT: &str = "999";
    pub const PONG: &str = "PONG";
    pub const UNAUTHORIZED: &str = "401";
    pub const INVALID_SUB: &str = "500";
}

/// Every frame carries a `TYPE`; the rest depends on it.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawFrame {
    #[serde(rename = "TYPE", default)]
    kind: String,
    #[serde(rename = "FROMSYMBOL", alias = "FSYM", default)]
    from: Option<String>,
    #[serde(rename = "TOSYMBOL", alias = "TSYM", default)]
    to: Option<String>,
    #[serde(rename = "PRICE", alias = "P", default)]
    price: Option<f64>,
    #[serde(rename = "MARKET", alias = "M", default)]
    market: Option<String>,
    #[serde(rename = "LASTUPDATE", alias = "TS", default)]
    traded_at: Option<i64>,
    #[serde(rename = "MESSAGE", default)]
    message: Option<String>,
    #[serde(rename = "SUB", alias = "PARAMETER", default)]
    sub: Option<String>,
}

/// A trade or ticker price for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub price: f64,
    pub from: String,
    pub to: String,
    pub market: Option<String>,
    /// Unix seconds, as sent by the streamer.
    pub traded_at: Option<i64>,
}

impl Tick {
    pub fn is_pair(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to == to
    }
}

/// Parsed frame content.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Trade(Tick),
    Pong,
    Heartbeat,
    Welcome(Option<String>),
    SubscribeComplete(Option<String>),
    /// `401`/`500` style refusal from the streamer.
    Refused { code: String, message: Option<String> },
    Other(String),
}

impl Kind {
    /// Price of a BTC/USD trade, the only frame that moves the ticker.
    pub fn btc_usd_price(&self) -> Option<f64> {
        match self {
            Kind::Trade(t) if t.is_pair("BTC", "USD") => Some(t.price),
            _ => None,
        }
    }
}

/// One inbound frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawFrame")]
pub struct MessageIn {
    pub kind: Kind,
}

impl From<RawFrame> for MessageIn {
    fn from(raw: RawFrame) -> Self {
        let kind = match raw.kind.as_str() {
            frame_type::TRADE => match (raw.price, raw.from, raw.to) {
                (Some(price), Some(from), Some(to)) if price.is_finite() => Kind::Trade(Tick {
                    price,
                    from,
                    to,
                    market: raw.market,
                    traded_at: raw.traded_at,
                }),
                _ => Kind::Other(raw.kind),
            },
            frame_type::PONG => Kind::Pong,
            frame_type::HEARTBEAT => Kind::Heartbeat,
            frame_type::WELCOME => Kind::Welcome(raw.message),
            frame_type::SUBSCRIBE_COMPLETE => Kind::SubscribeComplete(raw.sub),
            frame_type::UNAUTHORIZED | frame_type::INVALID_SUB => Kind::Refused {
                code: raw.kind,
                message: raw.message,
            },
            _ => Kind::Other(raw.kind),
        };
        MessageIn { kind }
    }
}

impl MessageIn {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Events delivered to the consumer of a WS client.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    Connected,
    Disconnected { code: Option<u16>, reason: String },
    /// A reconnect attempt will start after `delay_ms`.
    ReconnectScheduled { attempt: u32, delay_ms: u64 },
    Message(Kind),
    /// The connection could not be established.
    Error(String),
}

impl WsEvent {
    /// Close and error both mean the feed is down until the next `Connected`.
    pub fn is_outage(&self) -> bool {
        matches!(self, WsEvent::Disconnected { .. } | WsEvent::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(v: u16) -> Self {
        match v {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsConfig {
    pub url: String,
    pub subscriptions: Vec<Subscription>,
    pub reconnect: bool,
    pub base_reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
    pub ping_interval_ms: u64,
    pub connect_timeout_ms: u64,
    /// Treat the link as dead after this long without any frame. The
    /// streamer sends a heartbeat every 30 seconds. `0` disables the check.
    pub idle_timeout_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::CRYPTOCOMPARE_WS_URL.to_string(),
            subscriptions: vec![Subscription::coinbase_btc_usd()],
            reconnect: true,
            base_reconnect_delay_ms: 5_000,
            max_reconnect_delay_ms: 120_000,
            ping_interval_ms: 25_000,
            connect_timeout_ms: 30_000,
            idle_timeout_ms: 90_000,
        }
    }
}

impl WsConfig {
    pub fn backoff(&self) -> ReconnectBackoff {
        ReconnectBackoff::new(self.base_reconnect_delay_ms, self.max_reconnect_delay_ms)
    }
}

// ─── Reconnect backoff ───────────────────────────────────────────────────────

/// `base · 2^n` capped at `max`, where `n` counts attempts since the last
/// successful open.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    attempts: u32,
    base_ms: u64,
    max_ms: u64,
}

impl ReconnectBackoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            attempts: 0,
            base_ms,
            max_ms,
        }
    }

    /// Delay for the next attempt, and its 1-based number.
    pub fn next_delay(&mut self) -> (u32, u64) {
        let exp = self.attempts.min(20);
        let delay = self.base_ms.saturating_mul(1u64 << exp).min(self.max_ms);
        self.attempts += 1;
        (self.attempts, delay)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
