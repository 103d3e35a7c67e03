//! Shared types for SRUM normalization: native type tags, canonical storage
//! kinds, decoded values and destination table schemas.

pub mod enums;
pub mod error;
pub mod table;
pub mod value;

pub use enums::{CanonicalType, EseColumnType, NativeType, NumericKind, RegistryValueType};
pub use error::{ModelError, Result};
pub use table::{ColumnDescriptor, SchemaColumn, TableSchema, quote_identifier};
pub use value::{DecodedRow, DecodedValue, TIMESTAMP_FORMAT};
