use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{Result, StreamsError};

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses the `ts` field of streaming-history records.
///
/// Unlike a UTC-normalising parser, the offset written in the export is kept
/// on the returned value so later writers can decide what to do with it.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse a JSON value into a timezone-aware timestamp.
    ///
    /// Only JSON strings are accepted; anything else is an error.
    pub fn parse(value: &Value) -> Result<DateTime<FixedOffset>> {
        match value {
            Value::String(s) => Self::parse_str(s),
            other => Err(StreamsError::TimestampParse(other.to_string())),
        }
    }

    /// Parse an ISO-8601 / RFC 3339 string, preserving its offset.
    ///
    /// A trailing `Z` is read as `+00:00`. Strings without any offset are
    /// interpreted as UTC.
    pub fn parse_str(s: &str) -> Result<DateTime<FixedOffset>> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(StreamsError::TimestampParse(s.to_string()));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt);
        }

        // Offsets written without a colon, e.g. `+0100`.
        const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
                return Ok(dt);
            }
        }

        const NAIVE_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
            }
        }

        Err(StreamsError::TimestampParse(s.to_string()))
    }
}

/// Render a timestamp as ISO-8601 in UTC at second resolution,
/// e.g. `2021-01-01T00:00:00Z`.
pub fn to_iso_seconds_utc(ts: &DateTime<FixedOffset>) -> String {
    ts.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Drop the offset, keeping the wall-clock reading as written in the export.
pub fn strip_offset(ts: &DateTime<FixedOffset>) -> NaiveDateTime {
    ts.naive_local()
}
