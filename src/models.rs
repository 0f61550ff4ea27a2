use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const UNKNOWN_VIDEO: &str = "unknown";

/// One entry of the notification area.
///
/// Created from a `new_crash` push message, or manufactured by the client when
/// the push channel fails (`is_synthetic`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub video_filename: String,
    pub detection_timestamp: Option<String>,
    pub is_synthetic: bool,
}

impl AlertRecord {
    pub fn new(video_filename: Option<String>, detection_timestamp: Option<String>) -> Self {
        Self {
            video_filename: video_filename.unwrap_or_else(|| UNKNOWN_VIDEO.to_string()),
            detection_timestamp,
            is_synthetic: false,
        }
    }

    /// Placeholder entry shown in place of an alert when the channel drops.
    pub fn connection_error(reason: &str) -> Self {
        Self {
            video_filename: format!("Connection error: {}", reason),
            detection_timestamp: Some(Utc::now().to_rfc3339()),
            is_synthetic: true,
        }
    }

    /// Detection time for display: RFC 3339 values are reformatted, anything
    /// else is shown as received.
    pub fn display_timestamp(&self) -> String {
        match &self.detection_timestamp {
            Some(raw) => parse_timestamp(raw)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| raw.clone()),
            None => "N/A".to_string(),
        }
    }
}

/// Lifecycle of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    ClosedPendingRetry,
}

/// A row of the durable crash log.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub detection_timestamp: DateTime<Utc>,
    pub video_filename: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Weather conditions and recommended speed for a location.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdvisoryResult {
    #[serde(rename = "weather_desc")]
    pub weather_description: String,
    #[serde(default)]
    pub visibility_km: Option<f64>,
    #[serde(default)]
    pub chance_of_rain: Option<i64>,
    pub is_raining: bool,
    pub safe_speed_kmh: f64,
    pub location_used: String,
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}
