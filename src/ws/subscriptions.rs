//! Streamer subscription strings (`<channel>~<exchange>~<from>~<to>`) and the
//! set the client re-subscribes after a reconnect.

use super::MessageOut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Channel code of the trade stream.
pub const TRADE_CHANNEL: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subscription {
    pub channel: u16,
    pub exchange: String,
    pub from: String,
    pub to: String,
}

impl Subscription {
    pub fn trades(exchange: &str, from: &str, to: &str) -> Self {
        Self {
            channel: TRADE_CHANNEL,
            exchange: exchange.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// `0~Coinbase~BTC~USD`
    pub fn coinbase_btc_usd() -> Self {
        Self::trades("Coinbase", "BTC", "USD")
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}~{}~{}", self.channel, self.exchange, self.from, self.to)
    }
}

impl FromStr for Subscription {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('~').collect();
        let [channel, exchange, from, to] = parts.as_slice() else {
            return Err(format!("expected channel~exchange~from~to, got {:?}", s));
        };
        if [exchange, from, to].iter().any(|p| p.is_empty()) {
            return Err(format!("empty component in {:?}", s));
        }
        let channel = channel
            .parse::<u16>()
            .map_err(|e| format!("bad channel in {:?}: {}", s, e))?;
        Ok(Self {
            channel,
            exchange: exchange.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

impl TryFrom<String> for Subscription {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Subscription> for String {
    fn from(s: Subscription) -> Self {
        s.to_string()
    }
}

// ─── Tracking ────────────────────────────────────────────────────────────────

/// Subscriptions that are active from the client's point of view, in the
/// order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    subs: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new(initial: &[Subscription]) -> Self {
        let mut set = Self::default();
        for sub in initial {
            set.add(sub.clone());
        }
        set
    }

    /// Returns `false` when already present.
    pub fn add(&mut self, sub: Subscription) -> bool {
        if self.subs.contains(&sub) {
            return false;
        }
        self.subs.push(sub);
        true
    }

    pub fn remove(&mut self, sub: &Subscription) -> bool {
        let before = self.subs.len();
        self.subs.retain(|s| s != sub);
        before != self.subs.len()
    }

    /// Mirror an outbound message. Unparseable strings are ignored.
    pub fn track(&mut self, msg: &MessageOut) {
        match msg {
            MessageOut::SubAdd { subs } => {
                for sub in subs.iter().filter_map(|s| s.parse().ok()) {
                    if self.add(sub) {
                        tracing::debug!("Tracking subscription");
                    }
                }
            }
            MessageOut::SubRemove { subs } => {
                for sub in subs.iter().filter_map(|s| s.parse::<Subscription>().ok()) {
                    self.remove(&sub);
                }
            }
            MessageOut::Ping => {}
        }
    }

    /// Single `SubAdd` covering every tracked subscription.
    pub fn resubscribe_message(&self) -> Option<MessageOut> {
        if self.subs.is_empty() {
            return None;
        }
        Some(MessageOut::sub_add(&self.subs))
    }

    pub fn contains(&self, sub: &Subscription) -> bool {
        self.subs.contains(sub)
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}
