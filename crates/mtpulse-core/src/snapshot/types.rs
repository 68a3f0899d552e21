use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::Login;

/// Raw account record as reported by the terminal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub profit: f64,
    /// Deposit currency reported by the terminal
    #[serde(default)]
    pub currency: String,
}

/// Metrics of one account at one point in time
///
/// Immutable once built; a newer fetch supersedes it in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub label: String,
    pub login: Login,
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub profit: f64,
    pub currency: String,
    pub server: String,
    /// When the terminal answered (serialized as Unix epoch seconds)
    #[serde(with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// Serde adapter for timestamps as floating-point Unix epoch seconds
pub mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Convert a timestamp to fractional epoch seconds
    pub fn to_f64(ts: &DateTime<Utc>) -> f64 {
        ts.timestamp_micros() as f64 / 1_000_000.0
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(to_f64(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", secs)))
    }
}
