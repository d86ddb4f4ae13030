use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Cannot read input '{}': {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write output '{}': {source}", path.display())]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in '{}' at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required option: {0}")]
    Missing(&'static str),

    #[error("Cannot read job file '{}': {source}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job file '{}': {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl EtlError {
    pub(crate) fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn destination_unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::DestinationUnwritable {
            path: path.into(),
            source,
        }
    }
}
