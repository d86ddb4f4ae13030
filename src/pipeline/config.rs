use crate::error::ConfigError;
use crate::input_format::InputFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub error_strategy: ErrorStrategy,
    pub input_format: InputFormat,
    pub header: bool,
    pub buffer_size: usize,
    /// Event types the interaction filter accepts; `None` keeps the defaults
    pub event_types: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            error_strategy: ErrorStrategy::Skip,
            input_format: InputFormat::Auto,
            header: true,
            buffer_size: 65536, // 64KB
            event_types: None,
        }
    }
}

/// Simple error handling strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Skip unparseable input lines and continue processing
    Skip,
    /// Stop processing on first unparseable line
    FailFast,
}

/// A fully resolved job: where to read, where to write, and how.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub job_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub pipeline: PipelineConfig,
}

/// YAML job file. Every key is optional here; required options are checked
/// once the file and command-line values have been merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    pub job_name: Option<String>,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub input_format: Option<InputFormat>,
    pub header: Option<bool>,
    pub fail_fast: Option<bool>,
    pub event_types: Option<Vec<String>>,
}

impl JobFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping
        if content.trim().is_empty() {
            return Ok(JobFile::default());
        }
        serde_yaml::from_str(content)
    }

    /// Overlay values from the command line; `overrides` wins wherever it is set.
    pub fn merge(self, overrides: JobFile) -> JobFile {
        JobFile {
            job_name: overrides.job_name.or(self.job_name),
            input_path: overrides.input_path.or(self.input_path),
            output_path: overrides.output_path.or(self.output_path),
            input_format: overrides.input_format.or(self.input_format),
            header: overrides.header.or(self.header),
            fail_fast: overrides.fail_fast.or(self.fail_fast),
            event_types: overrides.event_types.or(self.event_types),
        }
    }

    /// Check required options and build the job configuration.
    pub fn into_job_config(self) -> Result<JobConfig, ConfigError> {
        let job_name = require(self.job_name.filter(|name| !name.trim().is_empty()), "job_name")?;
        let input_path = require(non_empty_path(self.input_path), "input_path")?;
        let output_path = require(non_empty_path(self.output_path), "output_path")?;

        if let Some(events) = &self.event_types {
            if events.is_empty() {
                return Err(ConfigError::Invalid("event_types must not be empty".to_string()));
            }
        }

        let defaults = PipelineConfig::default();
        Ok(JobConfig {
            job_name,
            input_path,
            output_path,
            pipeline: PipelineConfig {
                error_strategy: if self.fail_fast.unwrap_or(false) {
                    ErrorStrategy::FailFast
                } else {
                    ErrorStrategy::Skip
                },
                input_format: self.input_format.unwrap_or(defaults.input_format),
                header: self.header.unwrap_or(defaults.header),
                event_types: self.event_types,
                ..defaults
            },
        })
    }
}

fn require<T>(value: Option<T>, option: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(option))
}

fn non_empty_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}
