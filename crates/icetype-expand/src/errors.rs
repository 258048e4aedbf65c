use std::fmt;

use thiserror::Error;

/// Machine-readable reason for an expansion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpandErrorCode {
    MissingSchema,
    UnknownPath,
    NotARelation,
    CircularReference,
}

impl ExpandErrorCode {
    /// Stable `EXPAND_*` string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpandErrorCode::MissingSchema => "EXPAND_MISSING_SCHEMA",
            ExpandErrorCode::UnknownPath => "EXPAND_UNKNOWN_PATH",
            ExpandErrorCode::NotARelation => "EXPAND_NOT_A_RELATION",
            ExpandErrorCode::CircularReference => "EXPAND_CIRCULAR_REFERENCE",
        }
    }
}

impl fmt::Display for ExpandErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expansion failure. Nothing is produced when one is returned.
///
/// `path` is the requested expansion path and `schema` the name of the schema
/// being resolved when the failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message} (path '{path}', schema '{schema}')")]
pub struct ExpandError {
    pub code: ExpandErrorCode,
    pub path: String,
    pub schema: String,
    pub message: String,
}

impl ExpandError {
    pub fn new(
        code: ExpandErrorCode,
        path: impl Into<String>,
        schema: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            path: path.into(),
            schema: schema.into(),
            message: message.into(),
        }
    }

    /// Same as `self.code.as_str()`.
    pub fn code(&self) -> &'static str {
        self.code.as_str()
    }
}

pub type Result<T> = std::result::Result<T, ExpandError>;
