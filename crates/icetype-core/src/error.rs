use std::fmt;

use thiserror::Error;

/// Machine-readable reason for a DSL parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorCode {
    UnexpectedToken,
    UnexpectedEnd,
    UnterminatedString,
    InvalidParams,
    InvalidDefault,
    UnknownDirective,
    InvalidDirective,
    InvalidDefinition,
    InvalidVersion,
}

impl ParseErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorCode::UnexpectedToken => "UNEXPECTED_TOKEN",
            ParseErrorCode::UnexpectedEnd => "UNEXPECTED_END",
            ParseErrorCode::UnterminatedString => "UNTERMINATED_STRING",
            ParseErrorCode::InvalidParams => "INVALID_PARAMS",
            ParseErrorCode::InvalidDefault => "INVALID_DEFAULT",
            ParseErrorCode::UnknownDirective => "UNKNOWN_DIRECTIVE",
            ParseErrorCode::InvalidDirective => "INVALID_DIRECTIVE",
            ParseErrorCode::InvalidDefinition => "INVALID_DEFINITION",
            ParseErrorCode::InvalidVersion => "INVALID_VERSION",
        }
    }
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed DSL input.
///
/// `path` is the offending key of the raw definition (e.g. `email` or
/// `$index[1]`) and `column` is the 1-based character offset inside the DSL
/// string when the failure happened while tokenizing or parsing one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}{}", location_suffix(.path, .column))]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub path: Option<String>,
    pub column: Option<usize>,
    pub message: String,
}

impl ParseError {
    /// Error without a location. Attach one with [`ParseError::at_column`]
    /// and [`ParseError::with_path`].
    pub fn new(code: ParseErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            path: None,
            column: None,
            message: message.into(),
        }
    }

    /// Error located at a 1-based column of the DSL string.
    pub fn at_column(code: ParseErrorCode, column: usize, message: impl Into<String>) -> Self {
        Self {
            column: Some(column),
            ..Self::new(code, message)
        }
    }

    /// Attach the definition path, keeping an already-set one.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        if self.path.is_none() {
            self.path = Some(path.into());
        }
        self
    }

    /// Machine-readable code, e.g. `UNEXPECTED_TOKEN`.
    pub fn code(&self) -> &'static str {
        self.code.as_str()
    }
}

fn location_suffix(path: &Option<String>, column: &Option<usize>) -> String {
    match (path, column) {
        (Some(path), Some(column)) => format!(" (at {path}, column {column})"),
        (Some(path), None) => format!(" (at {path})"),
        (None, Some(column)) => format!(" (column {column})"),
        (None, None) => String::new(),
    }
}

/// Misuse of the type-unification table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeMappingError {
    #[error("unknown type '{type_name}'; valid types are: {}", .valid.join(", "))]
    UnknownType {
        type_name: String,
        valid: Vec<&'static str>,
    },
    #[error("invalid dialect '{dialect}'; valid dialects are: {}", .valid.join(", "))]
    InvalidDialect {
        dialect: String,
        valid: Vec<&'static str>,
    },
    #[error("dialect '{dialect}' does not support array type '{type_name}'")]
    UnsupportedArray { type_name: String, dialect: String },
    #[error("invalid parameters for type '{type_name}': {reason}")]
    InvalidParams { type_name: String, reason: String },
}

impl TypeMappingError {
    /// Machine-readable code, e.g. `UNKNOWN_TYPE`.
    pub fn code(&self) -> &'static str {
        match self {
            TypeMappingError::UnknownType { .. } => "UNKNOWN_TYPE",
            TypeMappingError::InvalidDialect { .. } => "INVALID_DIALECT",
            TypeMappingError::UnsupportedArray { .. } => "UNSUPPORTED_ARRAY",
            TypeMappingError::InvalidParams { .. } => "INVALID_TYPE_PARAMS",
        }
    }
}

/// Invalid schema version components or strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("version component '{component}' must be a non-negative integer, got {value}")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },
    #[error("invalid version string '{input}': expected 'major.minor.patch'")]
    Malformed { input: String },
    #[error("version component '{component}' overflowed")]
    Overflow { component: &'static str },
}

impl VersionError {
    /// Machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            VersionError::InvalidComponent { .. } => "INVALID_VERSION_COMPONENT",
            VersionError::Malformed { .. } => "INVALID_VERSION_FORMAT",
            VersionError::Overflow { .. } => "VERSION_OVERFLOW",
        }
    }
}

/// Core error type shared across IceType crates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("type mapping error: {0}")]
    TypeMapping(#[from] TypeMappingError),
    #[error("version error: {0}")]
    Version(#[from] VersionError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by IceType crates.
pub type Result<T> = std::result::Result<T, Error>;
