//! Error types for schema flattening and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors during schema loading and flattening.
#[derive(Debug, Error)]
pub enum FlattenError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    // Malformed input (exit code 2)
    #[error("schema root must be an object, got {actual}")]
    RootNotObject { actual: String },

    #[error("invalid $ref at {path}: expected string, got {actual}")]
    RefNotString { path: String, actual: String },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
}

impl FlattenError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlattenError::FileNotFound { .. } | FlattenError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            FlattenError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Flatten(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation or conformance error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the offending node.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
