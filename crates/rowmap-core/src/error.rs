//! Error types for the Rowmap core library
//!
//! Every failure of the mapping engine is a local validation failure returned
//! as a `TransformError`. Callers must check the result before issuing any
//! write: there are no partial or best-effort records.

use std::fmt;
use thiserror::Error;

/// Main error type for mapping operations
#[derive(Error, Debug)]
pub enum TransformError {
    /// A value is present but structurally wrong for its rule
    #[error("Shape mismatch at '{key}': expected {expected_shape}")]
    ShapeMismatch {
        key: String,
        expected_shape: String,
    },

    /// Two source keys produced the same column with different values
    #[error("Field collision on column '{column}': {}", keys.join(", "))]
    FieldCollision {
        column: String,
        keys: Vec<String>,
    },

    /// A candidate persistence record holds an object or array
    #[error("Non-scalar value for column '{key}'")]
    NonScalarValue { key: String },

    /// Only some members of a compound column group are present
    #[error("Incomplete compound field '{key}': missing {}", missing_members.join(", "))]
    IncompleteCompound {
        key: String,
        missing_members: Vec<String>,
    },

    /// Key is neither mapped, compound, status nor transient
    #[error("Unknown field '{key}'")]
    UnknownField { key: String },

    /// Input is not a record at all
    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    /// Mapping table or engine configuration is inconsistent
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our error type
pub type Result<T> = std::result::Result<T, TransformError>;

/// Stable machine-readable codes for each error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ShapeMismatch,
    FieldCollision,
    NonScalarValue,
    IncompleteCompound,
    UnknownField,
    InvalidRecord,
    Configuration,
    Json,
}

impl TransformError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(key: impl Into<String>, expected_shape: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            key: key.into(),
            expected_shape: expected_shape.into(),
        }
    }

    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// The field the error is about, if any
    ///
    /// Callers use this to attach the message to the right form input instead
    /// of surfacing a storage-layer rejection.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::ShapeMismatch { key, .. }
            | Self::NonScalarValue { key }
            | Self::IncompleteCompound { key, .. }
            | Self::UnknownField { key } => Some(key),
            Self::FieldCollision { column, .. } => Some(column),
            Self::InvalidRecord { .. } | Self::Configuration { .. } | Self::Json { .. } => None,
        }
    }

    /// The machine-readable code of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ShapeMismatch { .. } => ErrorCode::ShapeMismatch,
            Self::FieldCollision { .. } => ErrorCode::FieldCollision,
            Self::NonScalarValue { .. } => ErrorCode::NonScalarValue,
            Self::IncompleteCompound { .. } => ErrorCode::IncompleteCompound,
            Self::UnknownField { .. } => ErrorCode::UnknownField,
            Self::InvalidRecord { .. } => ErrorCode::InvalidRecord,
            Self::Configuration { .. } => ErrorCode::Configuration,
            Self::Json { .. } => ErrorCode::Json,
        }
    }
}

impl ErrorCode {
    /// Snake-case identifier of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ShapeMismatch => "shape_mismatch",
            ErrorCode::FieldCollision => "field_collision",
            ErrorCode::NonScalarValue => "non_scalar_value",
            ErrorCode::IncompleteCompound => "incomplete_compound",
            ErrorCode::UnknownField => "unknown_field",
            ErrorCode::InvalidRecord => "invalid_record",
            ErrorCode::Configuration => "configuration",
            ErrorCode::Json => "json",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Conversion implementations
impl From<serde_json::Error> for TransformError {
    fn from(err: serde_json::Error) -> Self {
        TransformError::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
