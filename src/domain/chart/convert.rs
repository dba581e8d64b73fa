//! Conversions from history wire types to chart points.

use super::wire::{HistoryEntry, HistoryResponse};
use super::HistoryPoint;
use crate::error::HttpError;

impl TryFrom<HistoryEntry> for HistoryPoint {
    type Error = HttpError;

    fn try_from(e: HistoryEntry) -> Result<Self, Self::Error> {
        let price = e
            .price_usd
            .ok_or_else(|| HttpError::EmptyPayload(format!("history point {} has no price", e.time)))?;
        Ok(Self {
            price,
            time: e.time,
        })
    }
}

impl HistoryResponse {
    /// Points with a parseable price. Empty responses are an error.
    pub fn into_points(self) -> Result<Vec<HistoryPoint>, HttpError> {
        let points: Vec<HistoryPoint> = self
            .data
            .into_iter()
            .filter_map(|e| HistoryPoint::try_from(e).ok())
            .collect();
        if points.is_empty() {
            return Err(HttpError::EmptyPayload("no price data received".into()));
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_points_skips_unpriced_entries() {
        let resp: HistoryResponse = serde_json::from_str(
            r#"{"data":[
                {"priceUsd":"67000.1","time":1000,"date":"2025-03-28T00:00:00.000Z"},
                {"priceUsd":null,"time":2000},
                {"priceUsd":"67100.5","time":3000}
            ]}"#,
        )
        .unwrap();
        let points = resp.into_points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].price, 67100.5);
        assert_eq!(points[1].time, 3000);
    }

    #[test]
    fn test_empty_history_is_error() {
        let resp: HistoryResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(matches!(resp.into_points(), Err(HttpError::EmptyPayload(_))));
        let resp: HistoryResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(resp.into_points().is_err());
    }
}
