//! Error types for source reading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a tabular database or a registry hive.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Snapshot file not found.
    #[error("source file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Snapshot Errors ===
    /// Snapshot is not valid JSON or does not match the expected layout.
    #[error("failed to parse snapshot {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value in the snapshot is not valid hexadecimal.
    #[error("invalid hex data in {location}: {source}")]
    InvalidHex {
        location: String,
        #[source]
        source: hex::FromHexError,
    },

    // === Reader Errors ===
    /// Table not present in the source.
    #[error("table not found: {table}")]
    TableNotFound { table: String },

    /// A record could not be read.
    #[error("failed to read record {index} of table {table}: {message}")]
    RecordRead {
        table: String,
        index: usize,
        message: String,
    },

    /// Registry key path not present in the hive.
    #[error("registry key not found: {path}")]
    KeyNotFound { path: String },
}

/// Result type for source reading operations.
pub type Result<T> = std::result::Result<T, IngestError>;
