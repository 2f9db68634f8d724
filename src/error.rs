//! Error types for probable-viewshed

use thiserror::Error;

/// Main error type for probable-viewshed operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("There are no point features in the input vector map <{vector}>")]
    NoObserverPoints { vector: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Malformed point record on line {line}: {record:?} ({reason})")]
    MalformedPointRecord {
        line: usize,
        record: String,
        reason: String,
    },

    #[error("Category {category} is used by more than one observer point; outputs would overwrite each other")]
    DuplicateCategory { category: u32 },

    #[error("Failed to launch {module}: {source}")]
    Spawn {
        module: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{module} failed ({status}): {stderr}")]
    CommandFailed {
        module: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected output from {module}: {reason}")]
    UnexpectedOutput { module: String, reason: String },

    #[error("Not running inside a GRASS GIS session (GISRC is not set)")]
    NoGrassSession,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger setup failed: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error(transparent)]
    Arguments(#[from] clap::Error),
}

impl Error {
    pub(crate) fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for probable-viewshed operations
pub type Result<T> = std::result::Result<T, Error>;
