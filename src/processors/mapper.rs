// src/processors/mapper.rs
use crate::pipeline::context::{MappedRecord, RawEventRecord};
use serde_json::Value;

/// Source path to target field projection, in output column order
pub const FIELD_MAPPINGS: [(&str, &str); 5] = [
    ("anonymousId", "ANONYMOUS_ID"),
    ("userId", "USER_ID"),
    ("properties.sku", "ITEM_ID"),
    ("event", "EVENT_TYPE"),
    ("timestamp", "TIMESTAMP_ISO"),
];

/// Projects a raw event onto the five target fields, dropping everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapper;

impl FieldMapper {
    pub fn new() -> Self {
        FieldMapper
    }

    pub fn apply(&self, record: &RawEventRecord) -> MappedRecord {
        let [anonymous_id, user_id, item_id, event_type, timestamp_iso] =
            FIELD_MAPPINGS.map(|(source, _)| record.lookup(source).and_then(stringify));

        MappedRecord {
            anonymous_id,
            user_id,
            item_id,
            event_type,
            timestamp_iso,
        }
    }
}

/// Render a mapped source value as a string column.
///
/// Strings are copied verbatim, numbers and booleans use their JSON text,
/// objects and arrays become compact JSON. Null has no value.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
