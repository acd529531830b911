//! Error types for decimals and terminology loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`Decimal`](crate::Decimal) arithmetic and parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Text is not a decimal number.
    #[error("invalid decimal: '{0}'")]
    Invalid(String),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The power-of-ten exponent left the supported range.
    #[error("decimal exponent overflow")]
    Overflow,

    /// A floating-point input was NaN or infinite.
    #[error("value is not finite: {0}")]
    NotFinite(String),
}

/// Result type for decimal operations.
pub type DecimalResult<T> = std::result::Result<T, DecimalError>;

/// Errors raised while building or querying a terminology.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Two concepts of the same table share a code.
    #[error("duplicate {kind} code: {code}")]
    DuplicateCode {
        /// Concept kind of the clashing entry.
        kind: &'static str,
        /// The duplicated code.
        code: String,
    },

    /// A concept was declared without any name.
    #[error("concept {0} has no names")]
    MissingName(String),

    /// A concept field failed validation.
    #[error("invalid concept {code}: {message}")]
    InvalidConcept {
        /// Code of the offending concept.
        code: String,
        /// What is wrong with it.
        message: String,
    },

    /// Search pattern is not a valid regular expression.
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Terminology document is not valid JSON for the expected shape.
    #[error("malformed terminology document: {0}")]
    Document(#[from] serde_json::Error),

    /// Terminology file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for terminology operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
