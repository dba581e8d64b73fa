//! Wire types for the CoinGecko global endpoint.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `GET /api/v3/global`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlobalResponse {
    #[serde(default)]
    pub data: Option<GlobalData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlobalData {
    #[serde(default)]
    pub market_cap_percentage: HashMap<String, f64>,
    #[serde(default)]
    pub active_cryptocurrencies: Option<u64>,
}

impl GlobalResponse {
    /// BTC share of total market cap. Zero counts as missing.
    pub fn btc_dominance(&self) -> Option<f64> {
        self.data
            .as_ref()
            .and_then(|d| d.market_cap_percentage.get("btc").copied())
            .filter(|v| *v != 0.0 && v.is_finite())
    }
}
