//! Error types for ingestion.

use crate::access::AuthError;
use thiserror::Error;

/// Errors that can occur while turning an upload into a session.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Caller could not be identified.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// File extension is not a supported tabular format.
    #[error("Unsupported file format '{0}'. Please upload .csv, .xlsx, or .xls files.")]
    UnsupportedFormat(String),

    /// Content could not be parsed as a table.
    #[error("Failed to parse upload: {0}")]
    ParseFailure(String),

    /// Failure outside of parsing (e.g. building the preview).
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl IngestError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::UnsupportedFormat(_) | Self::ParseFailure(_)
        )
    }
}

impl From<datafusion::arrow::error::ArrowError> for IngestError {
    fn from(e: datafusion::arrow::error::ArrowError) -> Self {
        IngestError::ParseFailure(e.to_string())
    }
}

impl From<calamine::Error> for IngestError {
    fn from(e: calamine::Error) -> Self {
        IngestError::ParseFailure(e.to_string())
    }
}
