// src/processors/timestamp.rs
use crate::pipeline::context::{MappedRecord, OutputRecord};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// `yyyy-MM-dd'T'HH:mm:ss.SSS'Z'` as a chrono format string
pub const ISO_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// chrono accepts variable-width numeric fields and leap second 60, so the
// exact shape (seconds 00-59) is checked first.
static ISO_MILLIS_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-5][0-9]\.[0-9]{3}Z$")
        .expect("ISO timestamp pattern is valid")
});

/// Parse a UTC millisecond timestamp into whole seconds since the Unix epoch.
///
/// The millisecond part is dropped, never rounded. Returns `None` for
/// anything that does not match the pattern exactly or names an impossible
/// calendar date.
pub fn parse_iso_millis(text: &str) -> Option<i64> {
    if !ISO_MILLIS_SHAPE.is_match(text) {
        return None;
    }
    NaiveDateTime::parse_from_str(text, ISO_MILLIS_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Appends the epoch-seconds `TIMESTAMP` column derived from `TIMESTAMP_ISO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNormalizer;

impl TimestampNormalizer {
    pub fn new() -> Self {
        TimestampNormalizer
    }

    pub fn apply(&self, record: MappedRecord) -> OutputRecord {
        let timestamp = record.timestamp_iso.as_deref().and_then(parse_iso_millis);
        OutputRecord::from_mapped(record, timestamp)
    }
}
