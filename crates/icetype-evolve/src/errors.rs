use icetype_core::{SchemaVersion, VersionError};
use thiserror::Error;

/// History construction and decoding failures.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("version {version} must be greater than the latest recorded version {latest}")]
    NonIncreasingVersion {
        version: SchemaVersion,
        latest: SchemaVersion,
    },
    #[error("malformed checksum '{checksum}': expected 'sha256:' followed by 64 hex digits")]
    InvalidChecksum { checksum: String },
    #[error("history json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history json schema error: {0}")]
    Schema(String),
}

impl HistoryError {
    /// Machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::NonIncreasingVersion { .. } => "HISTORY_VERSION_NOT_INCREASING",
            HistoryError::InvalidChecksum { .. } => "HISTORY_INVALID_CHECKSUM",
            HistoryError::Json(_) => "HISTORY_INVALID_JSON",
            HistoryError::Schema(_) => "HISTORY_SCHEMA_ERROR",
        }
    }
}

/// Errors surfaced by the evolution crate.
#[derive(Debug, Error)]
pub enum EvolveError {
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvolveError {
    /// Code of the wrapped error, or `INVALID_JSON` for decode failures.
    pub fn code(&self) -> &'static str {
        match self {
            EvolveError::History(err) => err.code(),
            EvolveError::Version(err) => err.code(),
            EvolveError::Json(_) => "INVALID_JSON",
        }
    }
}

pub type Result<T> = std::result::Result<T, EvolveError>;
