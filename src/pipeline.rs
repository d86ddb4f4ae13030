pub mod config;
pub mod context;
pub mod stream;

pub use config::{ErrorStrategy, JobConfig, JobFile, PipelineConfig};
pub use context::{MappedRecord, OutputRecord, ProcessingStats, RawEventRecord, OUTPUT_COLUMNS};
pub use stream::EventPipeline;
