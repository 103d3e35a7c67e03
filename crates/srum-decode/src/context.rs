//! Per-record decode context.
//!
//! Holds the values decoded so far for one record so a conditional rule can
//! read an earlier sibling. A context lives for exactly one record.

use srum_model::{DecodedRow, DecodedValue};

use crate::error::FieldDecodeError;

/// A field that decoded to null because of a [`FieldDecodeError`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFailure {
    pub column: String,
    pub error: FieldDecodeError,
}

/// Result of decoding one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutcome {
    pub row: DecodedRow,
    pub failures: Vec<FieldFailure>,
}

#[derive(Debug)]
pub struct RecordContext<'t> {
    table: &'t str,
    row: DecodedRow,
    failures: Vec<FieldFailure>,
}

impl<'t> RecordContext<'t> {
    /// Starts an empty record for destination table `table`.
    pub fn new(table: &'t str) -> Self {
        Self {
            table,
            row: DecodedRow::new(),
            failures: Vec::new(),
        }
    }

    pub fn table(&self) -> &'t str {
        self.table
    }

    /// Already decoded value of `column`; null when not decoded yet.
    pub fn sibling(&self, column: &str) -> &DecodedValue {
        self.row.value_or_null(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: DecodedValue) {
        self.row.insert(column, value);
    }

    /// Stores `value`, flattening structured fields into the row. Returns
    /// the column names written.
    pub fn merge(&mut self, column: &str, value: DecodedValue) -> Vec<String> {
        self.row.merge(column, value)
    }

    pub(crate) fn record_failure(&mut self, column: &str, error: FieldDecodeError) {
        self.failures.push(FieldFailure {
            column: column.to_string(),
            error,
        });
    }

    pub fn into_outcome(self) -> DecodeOutcome {
        DecodeOutcome {
            row: self.row,
            failures: self.failures,
        }
    }
}
