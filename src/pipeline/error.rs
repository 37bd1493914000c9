//! Error types for loading, cleaning and writing the loan tables.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing the loan-uptake tables.
#[derive(Debug, Error)]
pub enum PrepError {
    // === File System Errors ===
    /// Source file missing or unreadable.
    #[error("failed to read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write an output file.
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    // === CSV Parsing Errors ===
    /// Polars could not parse the decoded CSV text.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    // === Schema Errors ===
    /// An expected column is absent, either in a source file or in the
    /// merged table.
    #[error("column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    /// A lookup file does not have the key/value shape we need.
    #[error("invalid lookup table {path}: {reason}")]
    InvalidLookup { path: PathBuf, reason: String },

    // === Cleaning Errors ===
    /// A value left over after cleaning could not be cast to its final type.
    #[error("cannot convert {column} value '{value}' to {expected} (ClientID {client_id})")]
    InvalidValue {
        column: String,
        client_id: String,
        value: String,
        expected: &'static str,
    },

    // === Configuration Errors ===
    /// Configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for PrepError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;
