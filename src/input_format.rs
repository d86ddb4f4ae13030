// src/input_format.rs - Reading raw event records from JSON input

use crate::error::EtlError;
use crate::pipeline::config::ErrorStrategy;
use crate::pipeline::context::{ParseErrorInfo, ProcessingStats, RawEventRecord};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Path that selects stdin (input) or stdout (output)
pub const STDIO_PATH: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Detect per file: jsonl when every line is a JSON value, json otherwise
    #[default]
    #[value(name = "auto")]
    Auto,
    /// One JSON value per line
    #[value(name = "jsonl")]
    Jsonl,
    /// Concatenated JSON values; top-level arrays are expanded into records
    #[value(name = "json")]
    Json,
}

impl InputFormat {
    /// Narrow `Auto` to `Json` when the content opens with `[`. Any other
    /// `Auto` input is settled in [`read_records`] once its lines are parsed.
    pub fn resolve(self, content: &[u8]) -> InputFormat {
        match self {
            InputFormat::Auto if first_non_whitespace(content) == Some(b'[') => InputFormat::Json,
            other => other,
        }
    }
}

fn first_non_whitespace(content: &[u8]) -> Option<u8> {
    content.iter().copied().find(|b| !b.is_ascii_whitespace())
}

/// List the files behind an input path.
///
/// A directory contributes every regular file directly inside it, sorted by
/// name. Names starting with `.` or `_` (markers such as `_SUCCESS`) are
/// ignored. `-` stands for stdin and is returned as-is.
pub fn input_files(path: &Path) -> Result<Vec<PathBuf>, EtlError> {
    if path.as_os_str() == STDIO_PATH {
        return Ok(vec![path.to_path_buf()]);
    }

    let metadata = fs::metadata(path).map_err(|e| EtlError::source_unavailable(path, e))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| EtlError::source_unavailable(path, e))? {
        let entry = entry.map_err(|e| EtlError::source_unavailable(path, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        let file_type = entry
            .file_type()
            .map_err(|e| EtlError::source_unavailable(entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Read one source completely and parse it into raw records.
///
/// `source` names the input in errors and logs. Unparseable lines in jsonl
/// mode follow `strategy`; a syntax error in json mode is always fatal since
/// the stream cannot resynchronize after it. In auto mode, input whose lines
/// are not all JSON values is retried as a document before any line is
/// given up on.
pub fn read_records<R: Read>(
    mut input: R,
    source: &Path,
    format: InputFormat,
    strategy: &ErrorStrategy,
    stats: &mut ProcessingStats,
) -> Result<Vec<RawEventRecord>, EtlError> {
    let mut content = Vec::new();
    input
        .read_to_end(&mut content)
        .map_err(|e| EtlError::source_unavailable(source, e))?;

    let format = format.resolve(&content);
    debug!(source = %source.display(), ?format, bytes = content.len(), "Parsing input");

    let records = match format {
        InputFormat::Json => parse_document(&content, source)?,
        InputFormat::Jsonl => collect_lines(parse_lines(&content), source, strategy, stats)?,
        InputFormat::Auto => {
            let lines = parse_lines(&content);
            if lines.iter().all(|(_, parsed)| parsed.is_ok()) {
                collect_lines(lines, source, strategy, stats)?
            } else {
                match parse_document(&content, source) {
                    Ok(records) => {
                        debug!(source = %source.display(), "Input is not line-delimited, read as one JSON document");
                        records
                    }
                    Err(_) => collect_lines(lines, source, strategy, stats)?,
                }
            }
        }
    };

    stats.records_read += records.len();
    Ok(records)
}

/// Line number (1-based) and parse outcome of every non-blank line
type ParsedLine = (usize, Result<Value, serde_json::Error>);

// Bytes, not str: a line with invalid UTF-8 is a parse error of that line only
fn parse_lines(content: &[u8]) -> Vec<ParsedLine> {
    content
        .split(|&b| b == b'\n')
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_ascii()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_number, line)| (line_number, serde_json::from_slice::<Value>(line)))
        .collect()
}

fn collect_lines(
    lines: Vec<ParsedLine>,
    source: &Path,
    strategy: &ErrorStrategy,
    stats: &mut ProcessingStats,
) -> Result<Vec<RawEventRecord>, EtlError> {
    let mut records = Vec::new();

    for (line_number, parsed) in lines {
        match parsed {
            Ok(value) => records.push(RawEventRecord::from_value(value)),
            Err(e) => match strategy {
                ErrorStrategy::FailFast => {
                    return Err(EtlError::Parse {
                        path: source.to_path_buf(),
                        line: line_number,
                        message: e.to_string(),
                    })
                }
                ErrorStrategy::Skip => {
                    warn!(
                        source = %source.display(),
                        line = line_number,
                        error = %e,
                        "Skipping unparseable JSON line"
                    );
                    stats.parse_errors.push(ParseErrorInfo {
                        source_name: source.display().to_string(),
                        line_number,
                        error: e.to_string(),
                    });
                }
            },
        }
    }

    Ok(records)
}

fn parse_document(content: &[u8], source: &Path) -> Result<Vec<RawEventRecord>, EtlError> {
    let mut records = Vec::new();

    for value in serde_json::Deserializer::from_slice(content).into_iter::<Value>() {
        let value = value.map_err(|e| EtlError::Parse {
            path: source.to_path_buf(),
            line: e.line(),
            message: e.to_string(),
        })?;

        match value {
            Value::Array(items) => records.extend(items.into_iter().map(RawEventRecord::from_value)),
            other => records.push(RawEventRecord::from_value(other)),
        }
    }

    Ok(records)
}
