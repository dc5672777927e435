//! Error types for datalens.
//!
//! Degenerate statistical cases (too few numeric columns, insufficient
//! samples, empty value counts) are modeled as result values in their
//! modules, not as errors here. `LensError` covers the failures a caller
//! can actually act on: bad input files, missing columns, storage and
//! serialization problems, and the auth gate.

use thiserror::Error;

/// All errors produced by datalens operations.
#[derive(Debug, Error)]
pub enum LensError {
    /// CSV parsing failed.
    #[error("CSV parse error at line {line}: {message}")]
    CsvParse { line: usize, message: String },

    /// Uploaded file has an extension we don't handle.
    #[error("unsupported file format: '{filename}' (expected .csv, .xlsx, or .xls)")]
    UnsupportedFormat { filename: String },

    /// Spreadsheet could not be read.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Column not found in the table.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },

    /// Column is not numeric where numeric data is required.
    #[error("column '{name}' is not numeric")]
    NonNumericColumn { name: String },

    /// Insufficient data for the requested operation.
    #[error("need at least {min_required} values, got {actual}")]
    InsufficientData { min_required: usize, actual: usize },

    /// Column length does not match the table's row count.
    #[error("expected {expected} rows, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Chart options failed validation (e.g. zero bins).
    #[error("invalid chart options: {0}")]
    InvalidChart(String),

    /// An identity-requiring action was attempted with no session identity.
    #[error("authentication required")]
    AuthRequired,

    /// Persistence backend failure. Recoverable: the caller keeps running.
    #[error("storage error: {0}")]
    Storage(String),

    /// Dataset payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file reading or writing.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LensError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<rusqlite::Error> for LensError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for LensError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<calamine::Error> for LensError {
    fn from(e: calamine::Error) -> Self {
        Self::Spreadsheet(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for LensError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Spreadsheet(e.to_string())
    }
}
