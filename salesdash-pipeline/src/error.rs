//! Pipeline error types.
//!
//! Every failure mode has a named variant. Degenerate-but-valid data (an
//! empty table, zero variance, zero revenue) is never an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid filter on {field}: {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("Insufficient data for {operation}: need at least {required}, got {actual}")]
    InsufficientData {
        operation: String,
        required: usize,
        actual: usize,
    },

    #[error("Forecast horizon {horizon} outside [{min}, {max}]")]
    HorizonOutOfRange { horizon: u32, min: u32, max: u32 },

    #[error("Invalid parameter {param}: {reason}")]
    InvalidParameter { param: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    pub(crate) fn invalid_filter(field: &str, reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidFilter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_param(param: &str, reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidParameter {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for analytics operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Failures while reading a transaction file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}
