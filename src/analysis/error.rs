//! Error types for analysis requests.

use crate::access::AuthError;
use crate::chart::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid analysis type '{0}'")]
    InvalidAnalysisType(String),

    #[error("Missing required parameter '{0}'")]
    MissingParameter(&'static str),

    /// One or more requested columns are absent; lists every column the dataset has.
    #[error("One or more columns not found. Available columns: {}", available.join(", "))]
    ColumnNotFound {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Column '{column}' must be numeric for {purpose}")]
    NotNumeric {
        column: String,
        purpose: &'static str,
    },

    #[error("Need at least 2 numeric columns for correlation (found {found})")]
    InsufficientColumns { found: usize },

    #[error(
        "Too many columns for visual matrix ({found} numeric columns, limit {limit}). Please upload a filtered file."
    )]
    TooManyColumns { found: usize, limit: usize },

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("No data available after grouping")]
    NoDataAfterGrouping,

    #[error("Error generating chart: {0}")]
    Render(#[from] RenderError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AnalysisError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Render(_) | Self::Unexpected(_))
    }
}

impl From<datafusion::arrow::error::ArrowError> for AnalysisError {
    fn from(e: datafusion::arrow::error::ArrowError) -> Self {
        AnalysisError::Unexpected(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_not_found_lists_available_columns() {
        let err = AnalysisError::ColumnNotFound {
            missing: vec!["nope".into()],
            available: vec!["region".into(), "sales".into()],
        };
        assert_eq!(
            err.to_string(),
            "One or more columns not found. Available columns: region, sales"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AnalysisError::EmptyDataset.is_client_error());
        assert!(AnalysisError::Auth(AuthError::Unauthenticated).is_client_error());
        assert!(!AnalysisError::Unexpected("boom".into()).is_client_error());
        assert!(
            !AnalysisError::Render(RenderError::Backend("font".into())).is_client_error()
        );
    }
}
