//! twarcdb - Load twarc archives into a relational SQLite schema
//!
//! This library normalizes newline-delimited JSON archives of Twitter API
//! v2 responses (as collected by twarc) into relational tables for SQL
//! querying: tweets, authors, referenced-tweet mappings, and per-occurrence
//! entity tables.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`config`] - Layered configuration (defaults, file, environment)
//! - [`error`] - Custom error types with rich context
//! - [`model`] - Envelope types, typed table rows, and batch accumulators
//! - [`schema`] - Registry of object field sets and table columns
//! - [`expand`] - Dict-column expansion over record batches
//! - [`entities`] - Entity extraction into per-occurrence side tables
//! - [`references`] - Referenced-tweet classification and mapping tables
//! - [`assemble`] - Object-to-table assembly per object kind
//! - [`extract`] - Envelope-to-object extraction per task type
//! - [`ingest`] - Chunked ingestion driver
//! - [`storage`] - `SQLite` storage layer

pub mod assemble;
pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod expand;
pub mod extract;
pub mod ingest;
pub mod model;
pub mod references;
pub mod schema;
pub mod storage;

pub use cli::*;
pub use error::{Result, TwarcDbError};
pub use extract::TaskType;
pub use ingest::{IngestOptions, IngestReport, ingest_file};
pub use model::*;
pub use storage::Storage;

/// Default database filename
pub const DEFAULT_DB_NAME: &str = "twarcdb.db";

/// Get the default data directory for twarcdb
#[must_use]
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("twarcdb")
}

/// Get the default database path
#[must_use]
pub fn default_db_path() -> std::path::PathBuf {
    default_data_dir().join(DEFAULT_DB_NAME)
}

/// Format an integer with thousands separators.
#[must_use]
pub fn format_number(value: i64) -> String {
    let abs = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(abs.len() + abs.len() / 3);

    for (idx, ch) in abs.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut formatted: String = out.chars().rev().collect();
    if value < 0 {
        formatted.insert(0, '-');
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn format_number_adds_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(12_345_678), "12,345,678");
        assert_eq!(format_number(-12_345), "-12,345");
    }
}
