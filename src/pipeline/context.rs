use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Column order of every output row
pub const OUTPUT_COLUMNS: [&str; 6] = [
    "ANONYMOUS_ID",
    "USER_ID",
    "ITEM_ID",
    "EVENT_TYPE",
    "TIMESTAMP_ISO",
    "TIMESTAMP",
];

/// One tracked event as read from the input, before any filtering.
///
/// Keys are looked up explicitly; a missing key is just `None`. Input values
/// that are not JSON objects become an empty record, which no filter accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEventRecord {
    fields: Map<String, Value>,
}

impl RawEventRecord {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => RawEventRecord { fields },
            _ => RawEventRecord::default(),
        }
    }

    /// Top-level value for `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Resolve a dot-separated path such as `properties.sku` through nested
    /// objects. Any non-object along the way ends the lookup.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// True when `path` resolves to a key, whatever its value (including null)
    pub fn has_path(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A record projected onto the five target fields. `None` means the source
/// value was absent or null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedRecord {
    pub anonymous_id: Option<String>,
    pub user_id: Option<String>,
    pub item_id: Option<String>,
    pub event_type: Option<String>,
    pub timestamp_iso: Option<String>,
}

/// Final row: the mapped fields plus the derived epoch-seconds timestamp.
///
/// Field order matches [`OUTPUT_COLUMNS`]; the `csv` writer derives the
/// header row from the serialized names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OutputRecord {
    pub anonymous_id: Option<String>,
    pub user_id: Option<String>,
    pub item_id: Option<String>,
    pub event_type: Option<String>,
    pub timestamp_iso: Option<String>,
    pub timestamp: Option<i64>,
}

impl OutputRecord {
    pub fn from_mapped(mapped: MappedRecord, timestamp: Option<i64>) -> Self {
        OutputRecord {
            anonymous_id: mapped.anonymous_id,
            user_id: mapped.user_id,
            item_id: mapped.item_id,
            event_type: mapped.event_type,
            timestamp_iso: mapped.timestamp_iso,
            timestamp,
        }
    }
}

/// Parse error details for deferred reporting
#[derive(Debug, Clone)]
pub struct ParseErrorInfo {
    pub source_name: String,
    pub line_number: usize,
    pub error: String,
}

/// Runtime statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub files_read: usize,
    pub records_read: usize,
    pub records_filtered_out: usize,
    pub records_output: usize,
    pub timestamps_unparsed: usize,
    pub parse_errors: Vec<ParseErrorInfo>,
    pub processing_time: Duration,
}

impl ProcessingStats {
    /// Records that passed the interaction filter
    pub fn records_passed_filter(&self) -> usize {
        self.records_read - self.records_filtered_out
    }

    /// Fold the counters of another run (e.g. one input file) into these
    pub fn merge(&mut self, other: ProcessingStats) {
        self.files_read += other.files_read;
        self.records_read += other.records_read;
        self.records_filtered_out += other.records_filtered_out;
        self.records_output += other.records_output;
        self.timestamps_unparsed += other.timestamps_unparsed;
        self.parse_errors.extend(other.parse_errors);
        self.processing_time += other.processing_time;
    }
}
