// src/processors/filter.rs
use crate::pipeline::context::RawEventRecord;

/// Event types that count as user interactions by default
pub const SUPPORTED_EVENTS: [&str; 3] = ["Product Added", "Order Completed", "Product Clicked"];

/// Keeps only well-formed interaction events.
///
/// A record passes when `anonymousId`, `userId`, `properties.sku` and `event`
/// are all present and `event` is a string on the allow-list. Presence is
/// key membership: a key holding `null` is still present.
#[derive(Debug, Clone)]
pub struct InteractionFilter {
    allowed_events: Vec<String>,
}

impl Default for InteractionFilter {
    fn default() -> Self {
        InteractionFilter::new(SUPPORTED_EVENTS)
    }
}

impl InteractionFilter {
    pub fn new<I, S>(allowed_events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InteractionFilter {
            allowed_events: allowed_events.into_iter().map(Into::into).collect(),
        }
    }

    pub fn apply(&self, record: &RawEventRecord) -> bool {
        let has_properties_sku = record
            .get("properties")
            .and_then(|properties| properties.as_object())
            .is_some_and(|properties| properties.contains_key("sku"));

        record.contains("anonymousId")
            && record.contains("userId")
            && has_properties_sku
            && record
                .get("event")
                .and_then(|event| event.as_str())
                .is_some_and(|event| self.is_allowed(event))
    }

    fn is_allowed(&self, event: &str) -> bool {
        self.allowed_events.iter().any(|allowed| allowed == event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn complete_record() -> Value {
        json!({
            "anonymousId": "a1",
            "userId": "u1",
            "event": "Product Added",
            "timestamp": "2021-01-01T00:00:00.000Z",
            "properties": {"sku": "SKU1"}
        })
    }

    fn without(path: &str) -> RawEventRecord {
        let mut value = complete_record();
        match path.split_once('.') {
            Some((parent, child)) => {
                value[parent].as_object_mut().unwrap().remove(child);
            }
            None => {
                value.as_object_mut().unwrap().remove(path);
            }
        }
        RawEventRecord::from_value(value)
    }

    #[test]
    fn test_complete_record_passes() {
        let filter = InteractionFilter::default();
        assert!(filter.apply(&RawEventRecord::from_value(complete_record())));
    }

    #[test]
    fn test_every_supported_event_passes() {
        let filter = InteractionFilter::default();
        for event in SUPPORTED_EVENTS {
            let mut value = complete_record();
            value["event"] = json!(event);
            assert!(filter.apply(&RawEventRecord::from_value(value)), "{}", event);
        }
    }

    #[test]
    fn test_missing_required_key_is_excluded() {
        let filter = InteractionFilter::default();
        for path in ["anonymousId", "userId", "properties", "properties.sku", "event"] {
            assert!(!filter.apply(&without(path)), "record without {} passed", path);
        }
    }

    #[test]
    fn test_missing_timestamp_still_passes() {
        let filter = InteractionFilter::default();
        assert!(filter.apply(&without("timestamp")));
    }

    #[test]
    fn test_unlisted_event_is_excluded() {
        let filter = InteractionFilter::default();
        for event in [json!("Page Viewed"), json!("product added"), json!(""), json!(1), Value::Null] {
            let mut value = complete_record();
            value["event"] = event.clone();
            assert!(!filter.apply(&RawEventRecord::from_value(value)), "{:?}", event);
        }
    }

    #[test]
    fn test_properties_must_be_object() {
        let filter = InteractionFilter::default();
        let mut value = complete_record();
        value["properties"] = json!("sku");
        assert!(!filter.apply(&RawEventRecord::from_value(value)));

        let mut value = complete_record();
        value["properties"] = json!(["sku"]);
        assert!(!filter.apply(&RawEventRecord::from_value(value)));
    }

    #[test]
    fn test_null_values_count_as_present() {
        let filter = InteractionFilter::default();
        let mut value = complete_record();
        value["userId"] = Value::Null;
        value["properties"]["sku"] = Value::Null;
        assert!(filter.apply(&RawEventRecord::from_value(value)));
    }

    #[test]
    fn test_custom_allow_list() {
        let filter = InteractionFilter::new(["Page Viewed"]);
        let mut value = complete_record();
        value["event"] = json!("Page Viewed");
        assert!(filter.apply(&RawEventRecord::from_value(value)));
        assert!(!filter.apply(&RawEventRecord::from_value(complete_record())));
    }
}
