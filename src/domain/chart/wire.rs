//! Wire types for the CoinCap history endpoint.

use crate::shared::serde_util::lenient_f64;
use serde::{Deserialize, Serialize};

/// `GET /v2/assets/bitcoin/history?interval=&start=&end=`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub data: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "lenient_f64::deserialize")]
    pub price_usd: Option<f64>,
    pub time: i64,
    #[serde(default)]
    pub date: Option<String>,
}
