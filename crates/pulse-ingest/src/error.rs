//! Error types for report ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading report inputs.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Delimited Text Errors ===
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The file has no header row after the banner.
    #[error("CSV file has no header row: {path}")]
    EmptyCsv { path: PathBuf },

    // === Vendor Response Errors ===
    #[error("failed to decode {what} response: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

impl From<IngestError> for pulse_model::PulseError {
    /// Every ingestion failure means the source produced nothing usable.
    fn from(error: IngestError) -> Self {
        pulse_model::PulseError::SourceUnavailable {
            reason: error.to_string(),
        }
    }
}
