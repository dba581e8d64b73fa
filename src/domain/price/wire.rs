//! Wire types for the CoinCap asset endpoint.
//!
//! CoinCap encodes every number as a decimal string and uses `null` for
//! unknown values.

use crate::shared::serde_util::lenient_f64;
use serde::{Deserialize, Serialize};

/// `GET /v2/assets/bitcoin`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetResponse {
    pub data: Option<AssetData>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub price_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub change_percent24_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub market_cap_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub volume_usd24_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub supply: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_response_parses_string_decimals() {
        let json = r#"{
            "data": {
                "id": "bitcoin",
                "symbol": "BTC",
                "supply": "19840000.0000000000000000",
                "marketCapUsd": "1329498000000.1234",
                "volumeUsd24Hr": "9012345678.55",
                "priceUsd": "67012.4412345",
                "changePercent24Hr": "-1.2345",
                "vwap24Hr": "66900.11"
            },
            "timestamp": 1740076800000
        }"#;
        let resp: AssetResponse = serde_json::from_str(json).unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data.price_usd, Some(67012.4412345));
        assert_eq!(data.change_percent24_hr, Some(-1.2345));
        assert_eq!(data.supply, Some(19_840_000.0));
        assert_eq!(resp.timestamp, Some(1740076800000));
    }

    #[test]
    fn test_asset_response_tolerates_nulls() {
        let resp: AssetResponse =
            serde_json::from_str(r#"{"data":{"priceUsd":"1.5","marketCapUsd":null}}"#).unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data.market_cap_usd, None);
        assert_eq!(data.volume_usd24_hr, None);
    }
}
