//! Network URL constants and the endpoint set used by the HTTP layer.

use serde::{Deserialize, Serialize};

/// CoinCap REST API base URL (price, market data, history).
pub const COINCAP_API_URL: &str = "https://api.coincap.io";

/// CoinGecko REST API base URL (market dominance).
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com";

/// School auth backend base URL.
pub const AUTH_API_URL: &str = "https://n272-backend.onrender.com";

/// CryptoCompare streaming WebSocket URL.
pub const CRYPTOCOMPARE_WS_URL: &str = "wss://streamer.cryptocompare.com/v2";

/// Relative navigation targets between pages.
pub mod pages {
    pub const HOME: &str = "../";
    pub const BTC: &str = "btc.html?transition=true";
    pub const SCHOOL: &str = "school.html?transition=true";
}

/// Base URLs for every upstream the crate talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub coincap: String,
    pub coingecko: String,
    pub auth: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            coincap: COINCAP_API_URL.to_string(),
            coingecko: COINGECKO_API_URL.to_string(),
            auth: AUTH_API_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Strip trailing slashes so paths can be appended with `format!`.
    pub fn normalized(mut self) -> Self {
        for url in [&mut self.coincap, &mut self.coingecko, &mut self.auth] {
            let trimmed = url.trim_end_matches('/').len();
            url.truncate(trimmed);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_strips_trailing_slashes() {
        let endpoints = Endpoints {
            coincap: "http://localhost:9000//".into(),
            ..Endpoints::default()
        }
        .normalized();
        assert_eq!(endpoints.coincap, "http://localhost:9000");
        assert_eq!(endpoints.auth, AUTH_API_URL);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let endpoints: Endpoints =
            serde_json::from_str(r#"{"auth":"http://127.0.0.1:3000"}"#).unwrap();
        assert_eq!(endpoints.auth, "http://127.0.0.1:3000");
        assert_eq!(endpoints.coingecko, COINGECKO_API_URL);
    }
}
