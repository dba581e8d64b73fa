//! Custom serde helpers for upstream wire formats and config files.

/// Serializes a `Duration` as integer milliseconds.
///
/// Config files express every interval and TTL in milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Deserializes an optional decimal that may arrive as a JSON string or number.
///
/// CoinCap sends every numeric field as a string (`"priceUsd": "67012.44"`)
/// and uses `null` for unknown values.
pub mod lenient_f64 {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Raw::Number(n)) if n.is_finite() => Some(n),
            Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct Interval {
        #[serde(with = "super::duration_ms")]
        every: Duration,
    }

    #[derive(Deserialize)]
    struct Quote {
        #[serde(default, deserialize_with = "super::lenient_f64::deserialize")]
        price: Option<f64>,
    }

    #[test]
    fn test_duration_ms_roundtrip() {
        let json = serde_json::to_string(&Interval {
            every: Duration::from_secs(30),
        })
        .unwrap();
        assert_eq!(json, r#"{"every":30000}"#);
        let back: Interval = serde_json::from_str(&json).unwrap();
        assert_eq!(back.every, Duration::from_secs(30));
    }

    #[test]
    fn test_lenient_f64_accepts_strings_and_numbers() {
        let q: Quote = serde_json::from_str(r#"{"price":"67012.44"}"#).unwrap();
        assert_eq!(q.price, Some(67012.44));
        let q: Quote = serde_json::from_str(r#"{"price":12.5}"#).unwrap();
        assert_eq!(q.price, Some(12.5));
    }

    #[test]
    fn test_lenient_f64_unparseable_is_none() {
        let q: Quote = serde_json::from_str(r#"{"price":null}"#).unwrap();
        assert_eq!(q.price, None);
        let q: Quote = serde_json::from_str(r#"{"price":"n/a"}"#).unwrap();
        assert_eq!(q.price, None);
        let q: Quote = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(q.price, None);
    }
}
