//! Error types for portfolio analytics.
//!
//! Statistics degrade to neutral values on empty input and never surface an
//! error for it; the variants here cover caller mistakes, data the optimizer
//! or the simulators cannot work with, and the data-loading collaborators.
//! Solver non-convergence is not an error either: it is reported inside
//! [`OptimizationResult`](crate::portfolio::OptimizationResult).

use thiserror::Error;

/// Main error type for analytics operations.
///
/// # Examples
///
/// ```
/// use folio_analytics::error::AnalyticsError;
///
/// let err = AnalyticsError::InvalidParameter {
///     param: "confidence".to_string(),
///     value: "1.5".to_string(),
///     constraint: "in (0, 1)".to_string(),
/// };
/// assert!(err.to_string().contains("confidence"));
/// ```
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Fewer than two aligned observations, or no overlapping dates.
    #[error("Insufficient data: {context}")]
    InsufficientData {
        /// What was being computed when data ran out
        context: String,
    },

    /// Out-of-range or otherwise unusable argument.
    #[error("Invalid parameter: {param} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Vector/matrix shapes disagree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Asset identifier not present in the data.
    #[error("Unknown asset: {symbol}")]
    UnknownAsset {
        /// Asset identifier
        symbol: String,
    },

    /// Computation stopped through a [`StopToken`](crate::control::StopToken).
    #[error("Computation cancelled")]
    Cancelled,

    /// Computation ran past the deadline of its [`StopToken`](crate::control::StopToken).
    #[error("Computation deadline exceeded")]
    DeadlineExceeded,

    /// File could not be opened or read.
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File path
        path: String,
        /// Error description
        message: String,
    },

    /// Malformed CSV content.
    #[error("CSV parse error at line {line}: {message}")]
    CsvParse {
        /// 1-based line number
        line: usize,
        /// Error description
        message: String,
    },

    /// Configuration could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Create an insufficient-data error with descriptive context
    #[must_use]
    pub fn insufficient_data(context: impl Into<String>) -> Self {
        Self::InsufficientData {
            context: context.into(),
        }
    }

    /// Create an invalid-parameter error
    #[must_use]
    pub fn invalid_parameter(
        param: &str,
        value: impl std::fmt::Display,
        constraint: &str,
    ) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// True for errors caused by the caller's arguments rather than the data.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::DimensionMismatch { .. } | Self::UnknownAsset { .. }
        )
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
