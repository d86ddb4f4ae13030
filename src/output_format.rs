use crate::error::EtlError;
use crate::input_format::STDIO_PATH;
use crate::pipeline::context::{OutputRecord, OUTPUT_COLUMNS};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name used when the output path names a directory
pub const PART_FILE_NAME: &str = "part-00000.csv";

/// Where the single output file goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` is stdout; an existing directory or a path ending in a separator
    /// gets a part file inside it; anything else is the file itself.
    pub fn resolve(path: &Path) -> Self {
        if path.as_os_str() == STDIO_PATH {
            return OutputTarget::Stdout;
        }

        let raw = path.to_string_lossy();
        let names_directory = raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR) || path.is_dir();
        if names_directory {
            OutputTarget::File(path.join(PART_FILE_NAME))
        } else {
            OutputTarget::File(path.to_path_buf())
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            OutputTarget::Stdout => STDIO_PATH.to_string(),
            OutputTarget::File(path) => path.display().to_string(),
        }
    }
}

/// Serialize rows as comma-separated values, optionally preceded by the
/// header row. The header is written even when there are no rows.
pub fn write_csv<W: Write>(output: W, records: &[OutputRecord], header: bool) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    if header {
        writer.write_record(OUTPUT_COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write all rows to the target as one file.
///
/// File targets are staged in a temporary file next to the destination and
/// renamed into place once every row is flushed, so a failure never leaves
/// a truncated file behind.
pub fn write_output(target: &OutputTarget, records: &[OutputRecord], header: bool) -> Result<(), EtlError> {
    match target {
        OutputTarget::Stdout => {
            let stdout = io::stdout();
            write_csv(stdout.lock(), records, header)
                .map_err(|e| EtlError::destination_unwritable(STDIO_PATH, io::Error::from(e)))
        }
        OutputTarget::File(path) => write_file_atomically(path, records, header),
    }
}

fn write_file_atomically(path: &Path, records: &[OutputRecord], header: bool) -> Result<(), EtlError> {
    let unwritable = |e: io::Error| EtlError::destination_unwritable(path, e);

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(unwritable)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".interactions-etl-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(unwritable)?;
    debug!(staged = %staged.path().display(), "Staging output");

    write_csv(&mut staged, records, header).map_err(|e| unwritable(io::Error::from(e)))?;
    staged.as_file().sync_all().map_err(unwritable)?;
    staged.persist(path).map_err(|e| unwritable(e.error))?;

    Ok(())
}
