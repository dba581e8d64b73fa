//! Chart domain: historical series per period, downsampling and axis range.

#[cfg(feature = "http")]
pub mod client;
pub mod convert;
pub mod state;
pub mod wire;

use crate::shared::fmt::{num, time};
use crate::shared::Period;
use serde::{Deserialize, Serialize};

pub use state::{PeriodSwitcher, PriceRange, RealtimeSeries, RequestFence, SwitchDecision, Ticket};

/// Points the chart aims to show regardless of the upstream density.
pub const TARGET_POINTS: usize = 24;

/// Fraction of the value range added above and below the series.
pub const RANGE_PADDING: f64 = 0.1;

/// One historical price point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub price: f64,
    /// Unix milliseconds.
    pub time: i64,
}

/// Render-ready series for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub period: Period,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Padded lower bound of the values.
    pub min: f64,
    /// Padded upper bound of the values.
    pub max: f64,
    pub fetched_at: i64,
}

impl ChartSeries {
    /// Build a series from raw history: downsample, label in local time and
    /// pad the range. `None` when no point survives.
    pub fn from_history(period: Period, points: &[HistoryPoint], fetched_at: i64) -> Option<Self> {
        Self::from_history_with(period, points, fetched_at, |p, t| time::axis_label(p, t))
    }

    /// Like [`ChartSeries::from_history`] with a caller-supplied label function.
    pub fn from_history_with<F>(
        period: Period,
        points: &[HistoryPoint],
        fetched_at: i64,
        label: F,
    ) -> Option<Self>
    where
        F: Fn(Period, i64) -> String,
    {
        let kept = downsample(points, TARGET_POINTS);
        let values: Vec<f64> = kept.iter().map(|p| p.price).collect();
        let (min, max) = padded_bounds(&values)?;
        Some(Self {
            period,
            labels: kept.iter().map(|p| label(period, p.time)).collect(),
            values,
            min,
            max,
            fetched_at,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(last - first) / first * 100`, if the series has two points.
    pub fn change_percent(&self) -> Option<f64> {
        if self.values.len() < 2 {
            return None;
        }
        let first = *self.values.first()?;
        let last = *self.values.last()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }

    /// `+1.23%` style label for the period change.
    pub fn change_label(&self) -> Option<String> {
        self.change_percent().map(num::percent_change)
    }
}

/// Reduce `points` to roughly `target` entries.
///
/// Keeps index 0, the last index and every index divisible by
/// `max(1, len / target)`. A point whose timestamp is earlier than the last
/// kept one is dropped.
pub fn downsample(points: &[HistoryPoint], target: usize) -> Vec<HistoryPoint> {
    let len = points.len();
    if len == 0 {
        return Vec::new();
    }
    let step = (len / target.max(1)).max(1);
    let mut kept: Vec<HistoryPoint> = Vec::with_capacity(target + 2);
    let mut last_time = i64::MIN;

    for (i, point) in points.iter().enumerate() {
        if i != 0 && i != len - 1 && i % step != 0 {
            continue;
        }
        if point.time < last_time {
            continue;
        }
        last_time = point.time;
        kept.push(*point);
    }
    kept
}

/// Min and max of `values`, each pushed out by a tenth of the range.
pub fn padded_bounds(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let pad = (max - min) * RANGE_PADDING;
    Some((min - pad, max + pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<HistoryPoint> {
        (0..n)
            .map(|i| HistoryPoint {
                price: 60_000.0 + i as f64,
                time: 1_000 * i as i64,
            })
            .collect()
    }

    fn series(values: &[f64]) -> ChartSeries {
        let pts: Vec<HistoryPoint> = values
            .iter()
            .enumerate()
            .map(|(i, v)| HistoryPoint {
                price: *v,
                time: i as i64,
            })
            .collect();
        ChartSeries::from_history_with(Period::Hours24, &pts, 0, |_, t| t.to_string()).unwrap()
    }

    #[test]
    fn test_downsample_200_keeps_ends_and_order() {
        let input = points(200);
        let kept = downsample(&input, 24);
        assert_eq!(kept.first(), input.first());
        assert_eq!(kept.last(), input.last());
        assert!(kept.windows(2).all(|w| w[0].time <= w[1].time));
        // step 8: indices 0, 8, ..., 192 plus the final 199.
        assert_eq!(kept.len(), 26);
    }

    #[test]
    fn test_downsample_short_series_unchanged() {
        let input = points(10);
        assert_eq!(downsample(&input, 24), input);
        assert!(downsample(&[], 24).is_empty());
    }

    #[test]
    fn test_downsample_drops_regressing_timestamps() {
        let mut input = points(5);
        input[2].time = -5;
        let kept = downsample(&input, 24);
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|p| p.time != -5));
    }

    #[test]
    fn test_padded_bounds() {
        let (min, max) = padded_bounds(&[100.0, 200.0, 150.0]).unwrap();
        assert!((min - 90.0).abs() < 1e-9);
        assert!((max - 210.0).abs() < 1e-9);
        assert!(padded_bounds(&[]).is_none());
    }

    #[test]
    fn test_from_history_labels_each_kept_point() {
        let s = series(&[1.0, 2.0, 3.0]);
        assert_eq!(s.labels, vec!["0", "1", "2"]);
        assert_eq!(s.len(), 3);
        assert!(ChartSeries::from_history(Period::Days7, &[], 0).is_none());
    }

    #[test]
    fn test_every_period_downsamples_to_shared_target() {
        let input = points(200);
        for period in Period::ALL {
            let s = ChartSeries::from_history_with(period, &input, 0, |_, t| t.to_string()).unwrap();
            assert_eq!(s.len(), downsample(&input, TARGET_POINTS).len());
        }
        // A full 7d window at h6 is 28 raw points; step 1 keeps them all.
        let week = ChartSeries::from_history_with(Period::Days7, &points(28), 0, |_, t| t.to_string()).unwrap();
        assert_eq!(week.len(), 28);
    }

    #[test]
    fn test_change_percent() {
        let s = series(&[100.0, 90.0, 110.0]);
        assert!((s.change_percent().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(s.change_label().as_deref(), Some("+10.00%"));
        assert_eq!(series(&[5.0]).change_percent(), None);
    }
}
