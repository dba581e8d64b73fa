//! Conversions from CoinCap wire types to price samples.

use super::wire::AssetResponse;
use super::PriceSample;
use crate::error::HttpError;

impl AssetResponse {
    /// Extract the current price, stamped with the local receive time.
    pub fn into_sample(self, received_at: i64) -> Result<PriceSample, HttpError> {
        let price = self
            .data
            .and_then(|d| d.price_usd)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| HttpError::EmptyPayload("asset response has no priceUsd".into()))?;
        Ok(PriceSample {
            price,
            observed_at: received_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_sample() {
        let resp: AssetResponse =
            serde_json::from_str(r#"{"data":{"priceUsd":"67012.44"}}"#).unwrap();
        let sample = resp.into_sample(42).unwrap();
        assert_eq!(sample.price, 67012.44);
        assert_eq!(sample.observed_at, 42);
    }

    #[test]
    fn test_missing_price_is_empty_payload() {
        let resp: AssetResponse = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(matches!(
            resp.into_sample(0),
            Err(HttpError::EmptyPayload(_))
        ));
        let resp: AssetResponse =
            serde_json::from_str(r#"{"data":{"priceUsd":"not a number"}}"#).unwrap();
        assert!(resp.into_sample(0).is_err());
    }
}
