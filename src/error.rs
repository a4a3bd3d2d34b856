//! Custom error types for twarcdb.
//!
//! Provides structured error handling with detailed context for better
//! diagnostics. The variants mirror the failure modes of the ingestion
//! pipeline: unreadable sources, undecodable records, schema-shape
//! mismatches, expansion-inference failures, and storage errors.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for twarcdb operations.
#[derive(Error, Debug)]
pub enum TwarcDbError {
    // =========================================================================
    // Source Errors
    // =========================================================================
    /// Source file not found at the specified path.
    #[error("Source file not found at '{path}'")]
    SourceNotFound { path: PathBuf },

    /// A line of the source file could not be decoded as a twarc envelope.
    #[error("Failed to decode record at line {line}: {reason}")]
    RecordDecode { line: usize, reason: String },

    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    /// A raw object batch does not match the registry's expected shape.
    #[error("Invalid {kind} object: {reason}")]
    SchemaShape { kind: String, reason: String },

    /// A dict-column expansion was asked to infer keys from an all-null column.
    #[error("Cannot infer keys for column '{column}': no non-null cell found")]
    ExpansionInference { column: String },

    /// A record is missing a field the target table requires.
    #[error("{kind} record is missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// A table name was requested that the registry does not know.
    #[error("Unknown table '{table}'")]
    UnknownTable { table: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Database file not found (nothing ingested yet).
    #[error("No database found at '{path}'. Run 'twarcdb ingest' first.")]
    DatabaseNotFound { path: PathBuf },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // =========================================================================
    // IO / Configuration Errors
    // =========================================================================
    /// File read/write error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parsing error.
    #[error("Invalid configuration in '{path}': {reason}")]
    Config { path: PathBuf, reason: String },
}

/// Convenience result type for twarcdb operations.
pub type Result<T> = std::result::Result<T, TwarcDbError>;

#[cfg(test)]
mod tests {
    use super::TwarcDbError;

    #[test]
    fn error_messages_carry_context() {
        let err = TwarcDbError::RecordDecode {
            line: 42,
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("line 42"));

        let err = TwarcDbError::ExpansionInference {
            column: "public_metrics".to_string(),
        };
        assert!(err.to_string().contains("public_metrics"));
    }
}
