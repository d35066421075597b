//! # Temporal Types — UTC Epoch-Second Timestamps
//!
//! Defines `Timestamp`, the creation time of a file record. Records carry
//! seconds since the Unix epoch, so the type is UTC-only and truncated to
//! seconds precision.
//!
//! ## Wire Representation
//!
//! Serializes as a JSON integer of epoch seconds. Ledger view functions
//! return `u64` values as decimal strings, so deserialization also accepts a
//! string containing an integer.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A UTC timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Create a timestamp from Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("out of range: {secs}")))?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Calendar date only (e.g., `2026-01-15`), used in verification reports.
    pub fn date_label(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.epoch_secs())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EpochRepr {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = match EpochRepr::deserialize(deserializer)? {
            EpochRepr::Int(n) => n,
            EpochRepr::Text(s) => s.trim().parse::<i64>().map_err(|e| {
                serde::de::Error::custom(format!("invalid epoch seconds {s:?}: {e}"))
            })?,
        };
        Self::from_epoch_secs(secs).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(123_456_789).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:30:45Z");
    }

    #[test]
    fn test_epoch_roundtrip() {
        let ts = Timestamp::from_epoch_secs(1_768_478_400).unwrap();
        assert_eq!(ts.epoch_secs(), 1_768_478_400);
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
        assert_eq!(ts.date_label(), "2026-01-15");
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Timestamp::from_epoch_secs(i64::MAX).is_err());
    }

    #[test]
    fn test_serializes_as_integer() {
        let ts = Timestamp::from_epoch_secs(1_700_000_000).unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1700000000");
    }

    #[test]
    fn test_deserializes_from_decimal_string() {
        let ts: Timestamp = serde_json::from_str("\"1700000000\"").unwrap();
        assert_eq!(ts.epoch_secs(), 1_700_000_000);
    }

    #[test]
    fn test_rejects_non_numeric_string() {
        let result: Result<Timestamp, _> = serde_json::from_str("\"yesterday\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_matches_iso8601() {
        let ts = Timestamp::from_epoch_secs(0).unwrap();
        assert_eq!(format!("{ts}"), "1970-01-01T00:00:00Z");
    }
}
