//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A record failed to transform
    #[error("{0}")]
    Transform(#[from] rowmap_core::TransformError),

    /// A record inside a batch failed to transform
    #[error("Record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: rowmap_core::TransformError,
    },

    /// Some records of a checked file are invalid
    #[error("{failed} of {total} record(s) failed")]
    CheckFailed { failed: usize, total: usize },

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Transform(_) | Self::Record { .. } => 2,
            Self::CheckFailed { .. } => 3,
            Self::FileNotFound { .. } => 4,
            Self::InvalidFormat { .. } => 5,
            Self::Config(_) => 6,
            Self::InvalidArgs(_) => 7,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::TomlDe(_) | Self::TomlSer(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }

    /// The transform error behind this error, if any
    pub fn transform_error(&self) -> Option<&rowmap_core::TransformError> {
        match self {
            Self::Transform(e) | Self::Record { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context with a closure (only evaluated on error)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other {
                message: format!("{}: {}", f(), inner),
            }
        })
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let code = error
        .transform_error()
        .map(|e| format!(" [{}]", e.code()))
        .unwrap_or_default();

    if use_color {
        use colored::Colorize;
        format!("{}{} {}", "Error".red().bold(), code.yellow(), error)
    } else {
        format!("Error{}: {}", code, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::TransformError;

    #[test]
    fn test_exit_codes() {
        let err = Error::from(TransformError::NonScalarValue { key: "notes".into() });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(Error::config("bad").exit_code(), 6);
        assert_eq!(Error::CheckFailed { failed: 1, total: 3 }.exit_code(), 3);
        assert!(Error::invalid_args("x").should_show_help());
    }

    #[test]
    fn test_format_error_includes_code() {
        let err = Error::Record {
            index: 2,
            source: TransformError::UnknownField { key: "fristName".into() },
        };
        assert_eq!(
            format_error(&err, false),
            "Error [unknown_field]: Record 2: Unknown field 'fristName'"
        );

        let err = Error::other("boom");
        assert_eq!(format_error(&err, false), "Error: boom");
    }

    #[test]
    fn test_with_context() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.with_context(|| "reading rows.json".to_string()).unwrap_err();
        assert!(err.to_string().starts_with("reading rows.json: IO error"));
    }
}
