use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PulseError {
    /// The vendor call failed outright (bad status, empty or malformed body).
    #[error("source unavailable: {reason}")]
    SourceUnavailable { reason: String },
    /// The vendor rejected part of the requested metric set.
    #[error("metric set not supported by source: {reason}")]
    PartialMetricUnavailable { reason: String },
    #[error("malformed value in column {column}: {value:?}")]
    MalformedValue { column: String, value: String },
    #[error("missing configuration key `{key}` (set {env_var} or add it to the config file)")]
    ConfigurationMissing { key: String, env_var: String },
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("row has {actual} values but the table declares {expected} columns")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("frame operation failed: {0}")]
    Frame(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, PulseError>;
