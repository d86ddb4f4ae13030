// src/pipeline/stream.rs
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, info_span};

use crate::error::EtlError;
use crate::input_format::{input_files, read_records, STDIO_PATH};
use crate::output_format::{write_output, OutputTarget};
use crate::pipeline::config::{JobConfig, PipelineConfig};
use crate::pipeline::context::{OutputRecord, ProcessingStats, RawEventRecord};
use crate::processors::{EventRecordTransformer, InteractionFilter};

/// Main pipeline orchestrator: read everything, transform, write one file.
pub struct EventPipeline {
    transformer: EventRecordTransformer,
    config: PipelineConfig,
}

impl EventPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let filter = match &config.event_types {
            Some(events) => InteractionFilter::new(events.iter().cloned()),
            None => InteractionFilter::default(),
        };
        EventPipeline {
            transformer: EventRecordTransformer::new(filter),
            config,
        }
    }

    /// Run raw records through Filter, Mapper and TimestampNormalizer.
    ///
    /// Output order follows input order. Every record that passes the filter
    /// yields exactly one output row.
    pub fn process_records<I>(&self, records: I) -> (Vec<OutputRecord>, ProcessingStats)
    where
        I: IntoIterator<Item = RawEventRecord>,
    {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();
        let mut output = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            stats.records_read += 1;

            let Some(row) = self.transformer.transform(&record) else {
                stats.records_filtered_out += 1;
                continue;
            };

            if row.timestamp.is_none() {
                stats.timestamps_unparsed += 1;
                debug!(
                    record = index + 1,
                    timestamp_iso = row.timestamp_iso.as_deref().unwrap_or(""),
                    "Unparseable timestamp, TIMESTAMP left empty"
                );
            }
            output.push(row);
        }

        stats.records_output = output.len();
        stats.processing_time = start_time.elapsed();
        (output, stats)
    }

    /// Load every raw record behind `input_path`, in file-name order.
    pub fn load(&self, input_path: &Path) -> Result<(Vec<RawEventRecord>, ProcessingStats), EtlError> {
        let mut stats = ProcessingStats::default();
        let mut records = Vec::new();

        for file in input_files(input_path)? {
            let loaded = if file.as_os_str() == STDIO_PATH {
                let stdin = io::stdin();
                read_records(
                    stdin.lock(),
                    &file,
                    self.config.input_format,
                    &self.config.error_strategy,
                    &mut stats,
                )?
            } else {
                let handle = File::open(&file).map_err(|e| EtlError::source_unavailable(&file, e))?;
                read_records(
                    BufReader::with_capacity(self.config.buffer_size, handle),
                    &file,
                    self.config.input_format,
                    &self.config.error_strategy,
                    &mut stats,
                )?
            };
            debug!(file = %file.display(), records = loaded.len(), "Loaded input file");
            stats.files_read += 1;
            records.extend(loaded);
        }

        Ok((records, stats))
    }

    /// Execute a whole job. Nothing is written unless all input was read.
    pub fn run(&self, job: &JobConfig) -> Result<ProcessingStats, EtlError> {
        let span = info_span!("job", job_name = %job.job_name);
        let _enter = span.enter();
        let start_time = Instant::now();

        info!(input = %job.input_path.display(), "Input file");
        let (records, load_stats) = self.load(&job.input_path)?;
        info!(
            files = load_stats.files_read,
            records = load_stats.records_read,
            parse_errors = load_stats.parse_errors.len(),
            "Input file total record count"
        );

        let (rows, transform_stats) = self.process_records(records);
        info!(records = transform_stats.records_passed_filter(), "Filtered record count");

        let target = OutputTarget::resolve(&job.output_path);
        write_output(&target, &rows, self.config.header)?;

        // Load already counted the records it read
        let mut stats = ProcessingStats {
            records_read: 0,
            ..transform_stats
        };
        stats.merge(load_stats);
        stats.processing_time = start_time.elapsed();

        info!(
            output = %target.display_name(),
            rows = stats.records_output,
            timestamps_unparsed = stats.timestamps_unparsed,
            elapsed = %humantime::format_duration(stats.processing_time),
            "Wrote output"
        );
        Ok(stats)
    }
}

impl Default for EventPipeline {
    fn default() -> Self {
        EventPipeline::new(PipelineConfig::default())
    }
}
