//! Error types for the decoding engine.

use srum_ingest::IngestError;
use srum_model::{CanonicalType, ModelError, NativeType, NumericKind};
use thiserror::Error;

/// Problems with the decode configuration or a table's shape.
///
/// Always fatal: partial output from a wrong configuration would be
/// misleading evidence.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A native type appears under two canonical types.
    #[error("native type {native} is mapped to both {first} and {second}")]
    OverlappingTypeMap {
        native: NativeType,
        first: CanonicalType,
        second: CanonicalType,
    },

    /// No canonical type could be determined for a column.
    #[error("column {table}.{column} has unmapped native type {native}")]
    UnmappedType {
        table: String,
        column: String,
        native: NativeType,
    },

    /// A value carries a native type the type map does not know.
    #[error("unknown native type {native} for column {column}")]
    UnknownNativeType { column: String, native: NativeType },

    /// A DATETIME column has no timestamp rule.
    #[error("column {table}.{column} is DATETIME but no timestamp rule applies")]
    MissingDatetimeRule { table: String, column: String },

    /// A conditional rule depends on a column positioned after it.
    #[error("column {table}.{column} depends on {sibling}, which comes later in the record")]
    MisorderedSibling {
        table: String,
        column: String,
        sibling: String,
    },

    /// A conditional rule depends on a column the table does not have.
    #[error("column {table}.{column} depends on {sibling}, which the table does not have")]
    MissingSibling {
        table: String,
        column: String,
        sibling: String,
    },

    /// A conditional rule wraps another conditional rule.
    #[error("rule for column {column} nests one sibling condition inside another")]
    NestedConditional { column: String },

    /// A conditional rule names its own column as the sibling.
    #[error("rule for column {column} depends on itself")]
    SelfReferentialSibling { column: String },

    /// Two rules share a scope and column name.
    #[error("duplicate rule for column {column} ({scope})")]
    DuplicateRule { scope: String, column: String },

    /// The destination schema could not be built.
    #[error(transparent)]
    Schema(#[from] ModelError),
}

/// A single field could not be decoded. The field is stored as null and
/// the rest of the record continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldDecodeError {
    #[error("expected {expected} bytes for {kind}, got {actual}")]
    Width {
        kind: NumericKind,
        expected: usize,
        actual: usize,
    },

    #[error("invalid UTF-16LE data ({len} bytes)")]
    Encoding { len: usize },

    #[error("timestamp out of range: {value}")]
    OutOfRange { value: String },

    #[error("malformed {kind} blob: need {needed} bytes, got {actual}")]
    MalformedBlob {
        kind: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("unsigned value {value} does not fit a signed 64-bit integer")]
    IntegerOverflow { value: u64 },

    #[error("GUID must be 16 bytes, got {actual}")]
    Guid { actual: usize },
}

/// Errors surfaced by table and registry processing.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The source could not be read; fatal for the current table only.
    #[error("failed to read source: {0}")]
    Source(#[from] IngestError),
}

impl DecodeError {
    pub fn is_config(&self) -> bool {
        matches!(self, DecodeError::Config(_))
    }
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
