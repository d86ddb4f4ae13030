// src/lib.rs
pub mod error;
pub mod input_format;
pub mod output_format;
pub mod pipeline;
pub mod processors;

pub use error::*;
pub use pipeline::*;

pub use input_format::InputFormat;
pub use output_format::OutputTarget;
pub use processors::{
    parse_iso_millis, EventRecordTransformer, FieldMapper, InteractionFilter, TimestampNormalizer,
    SUPPORTED_EVENTS,
};
