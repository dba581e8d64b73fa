//! Price domain: the live BTC/USD sample and the ticker that gates updates.

#[cfg(feature = "http")]
pub mod client;
pub mod convert;
pub mod state;
pub mod wire;

use crate::shared::fmt::num;
use serde::{Deserialize, Serialize};

pub use state::PriceTicker;

/// Smallest price move that produces a floating delta label.
pub const DELTA_EPSILON: f64 = 0.01;

/// The most recent BTC/USD price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    /// Unix milliseconds.
    pub observed_at: i64,
}

/// Where an accepted price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Stream,
    Poll,
    Synthesized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceDirection {
    Up,
    Down,
    Unchanged,
}

/// An accepted price change, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub sample: PriceSample,
    pub previous: Option<f64>,
    pub source: PriceSource,
}

impl PriceUpdate {
    /// Difference to the previously displayed price.
    pub fn delta(&self) -> Option<f64> {
        self.previous.map(|p| self.sample.price - p)
    }

    pub fn direction(&self) -> PriceDirection {
        match self.delta() {
            Some(d) if d > 0.0 => PriceDirection::Up,
            Some(d) if d < 0.0 => PriceDirection::Down,
            _ => PriceDirection::Unchanged,
        }
    }

    /// Price label (`67012.44`).
    pub fn label(&self) -> String {
        num::price(self.sample.price)
    }

    /// Floating `+12.34` label, shown only for moves larger than a cent.
    pub fn floating_delta(&self) -> Option<String> {
        self.delta()
            .filter(|d| d.abs() > DELTA_EPSILON)
            .map(num::signed_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(price: f64, previous: Option<f64>) -> PriceUpdate {
        PriceUpdate {
            sample: PriceSample {
                price,
                observed_at: 0,
            },
            previous,
            source: PriceSource::Stream,
        }
    }

    #[test]
    fn test_first_price_has_no_delta() {
        let u = update(67000.0, None);
        assert_eq!(u.delta(), None);
        assert_eq!(u.direction(), PriceDirection::Unchanged);
        assert_eq!(u.floating_delta(), None);
        assert_eq!(u.label(), "67000.00");
    }

    #[test]
    fn test_floating_delta_above_a_cent() {
        let u = update(67012.34, Some(67000.0));
        assert_eq!(u.direction(), PriceDirection::Up);
        assert_eq!(u.floating_delta().as_deref(), Some("+12.34"));

        let u = update(66990.0, Some(67000.0));
        assert_eq!(u.direction(), PriceDirection::Down);
        assert_eq!(u.floating_delta().as_deref(), Some("-10.00"));
    }

    #[test]
    fn test_sub_cent_move_has_no_floating_label() {
        let u = update(67000.005, Some(67000.0));
        assert_eq!(u.direction(), PriceDirection::Up);
        assert_eq!(u.floating_delta(), None);
    }
}
