//! Error types for the geocov pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum GeocovError {
    /// The raw source file does not exist.
    #[error("Source not found: '{}'", path.display())]
    SourceNotFound { path: PathBuf },

    /// The columns of a file do not satisfy the expected schema.
    #[error("Schema mismatch in '{}' ({expected}): missing {missing:?}", path.display())]
    SchemaMismatch {
        path: PathBuf,
        /// Schema the file was read as, e.g. "rich layout" or "checkpoint".
        expected: String,
        missing: Vec<String>,
    },

    /// The destination path exists but is not a directory.
    #[error("Invalid destination: '{}' is not a directory", path.display())]
    InvalidDestination { path: PathBuf },

    /// A single row holds a malformed field.
    #[error("Row parse error at row {row}, column '{column}': {message}")]
    RowParse {
        row: usize,
        column: String,
        message: String,
    },

    /// The topic registry has no pattern for the requested topic.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Two input batches share a checkpoint key.
    #[error("Duplicate batch key: {0}")]
    DuplicateKey(String),

    /// A batch key cannot be turned into a safe file name.
    #[error("Invalid batch key: {0:?}")]
    InvalidKey(String),

    /// Error reading or writing a file.
    #[error("IO error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GeocovError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeocovError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole call rather than a single batch or row.
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            GeocovError::InvalidDestination { .. }
                | GeocovError::DuplicateKey(_)
                | GeocovError::InvalidKey(_)
                | GeocovError::UnknownTopic(_)
                | GeocovError::Config(_)
                | GeocovError::Regex(_)
        )
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, GeocovError>;
