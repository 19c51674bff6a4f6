//! Timestamp utilities
//!
//! Immich reports `localDateTime` and `fileCreatedAt` as RFC 3339 strings.

use chrono::{DateTime, Datelike, FixedOffset, Utc};

use crate::{Error, Result};

/// Parse an RFC 3339 timestamp, keeping its offset
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| Error::Decode(format!("invalid timestamp {:?}: {}", value, e)))
}

/// Parse an RFC 3339 timestamp and normalize it to UTC
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).map(|dt| dt.with_timezone(&Utc))
}

/// Calendar year as written in the timestamp (no timezone shift)
pub fn year_of(value: &str) -> Result<i32> {
    parse_timestamp(value).map(|dt| dt.year())
}

/// Seconds since the Unix epoch
pub fn epoch_seconds(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp()
}
