pub mod filter;
pub mod mapper;
pub mod timestamp;

pub use filter::{InteractionFilter, SUPPORTED_EVENTS};
pub use mapper::{FieldMapper, FIELD_MAPPINGS};
pub use timestamp::{parse_iso_millis, TimestampNormalizer};

use crate::pipeline::context::{OutputRecord, RawEventRecord};

/// Filter, Mapper and TimestampNormalizer composed in that order.
///
/// Each record is handled on its own; there is no state carried between
/// records, so the same input always yields the same output.
#[derive(Debug, Clone, Default)]
pub struct EventRecordTransformer {
    filter: InteractionFilter,
    mapper: FieldMapper,
    normalizer: TimestampNormalizer,
}

impl EventRecordTransformer {
    pub fn new(filter: InteractionFilter) -> Self {
        EventRecordTransformer {
            filter,
            mapper: FieldMapper::new(),
            normalizer: TimestampNormalizer::new(),
        }
    }

    /// `None` when the record is not an interaction event
    pub fn transform(&self, record: &RawEventRecord) -> Option<OutputRecord> {
        if !self.filter.apply(record) {
            return None;
        }
        let mapped = self.mapper.apply(record);
        Some(self.normalizer.apply(mapped))
    }
}
