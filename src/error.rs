//! Custom error types for os-event-export
//!
//! This module defines the error hierarchy for the exporter using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for exporter operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Connection-level failures talking to the API
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the API
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Malformed or unexpected export archive
    #[error("Archive error: {0}")]
    Archive(String),

    /// Export file did not become available in time
    #[error("Timed out after {waited_secs}s waiting for export file {file_id}")]
    Timeout { file_id: String, waited_secs: u64 },

    /// Validation errors for user input and raw data
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ExportError {
    /// Create an error from a non-success HTTP response
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Check if this is a polling timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::http(status.as_u16(), err.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

/// Result type alias for exporter operations
pub type ExportResult<T> = Result<T, ExportError>;
