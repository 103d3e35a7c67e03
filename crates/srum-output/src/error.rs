//! Error types for the SQLite sink.

use std::path::PathBuf;
use thiserror::Error;

/// Sink failures that stop a table or the whole run.
///
/// Per-row insert failures are not errors at this level; they are logged
/// and counted in [`crate::WriteStats`].
#[derive(Debug, Error)]
pub enum OutputError {
    /// The destination database could not be opened.
    #[error("failed to open output database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// An existing destination file could not be removed.
    #[error("failed to remove existing output {path}: {source}")]
    RemoveExisting {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Connection settings could not be applied.
    #[error("failed to configure connection: {0}")]
    Configure(#[source] rusqlite::Error),

    /// The create statement failed.
    #[error("failed to create table {table} ({sql}): {source}")]
    CreateTable {
        table: String,
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Columns of an existing table could not be read.
    #[error("failed to inspect table {table}: {source}")]
    InspectTable {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A column missing from an existing table could not be added.
    #[error("failed to add column to table {table} ({sql}): {source}")]
    AlterTable {
        table: String,
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Begin, commit or rollback failed.
    #[error("transaction failed for table {table}: {source}")]
    Transaction {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, OutputError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_error_names_table() {
        let err = OutputError::CreateTable {
            table: "NetworkUsageData".to_string(),
            sql: "CREATE TABLE".to_string(),
            source: rusqlite::Error::QueryReturnedNoRows,
        };
        assert!(err.to_string().contains("NetworkUsageData"));
    }
}
