#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::enums::{CanonicalType, NativeType};
use crate::error::{ModelError, Result};

/// A source column: name plus the type tag the reader reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub native_type: NativeType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, native_type: impl Into<NativeType>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
        }
    }
}

/// One destination column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub canonical: CanonicalType,
}

/// Ordered destination schema of one table.
///
/// Column order is the order of the create statement and of every insert
/// statement for the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<SchemaColumn>,
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Builds a schema, rejecting empty names and duplicate columns.
    pub fn new(name: impl Into<String>, columns: Vec<SchemaColumn>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyTableName);
        }
        for (index, column) in columns.iter().enumerate() {
            if columns[..index]
                .iter()
                .any(|prior| prior.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(ModelError::DuplicateColumn {
                    table: name,
                    column: column.name.clone(),
                });
            }
        }
        Ok(Self {
            name,
            columns,
            primary_key: Vec::new(),
        })
    }

    /// Sets the primary key; every key column must be part of the schema.
    pub fn with_primary_key<I, S>(mut self, key: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key: Vec<String> = key.into_iter().map(Into::into).collect();
        if let Some(missing) = key.iter().find(|name| self.column(name).is_none()) {
            return Err(ModelError::UnknownKeyColumn {
                table: self.name,
                column: missing.clone(),
            });
        }
        self.primary_key = key;
        Ok(self)
    }

    /// Column named `name`, compared ASCII case-insensitively.
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Idempotent create statement.
    pub fn create_statement(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("{} {}", quote_identifier(&column.name), column.canonical))
            .collect();
        if !self.primary_key.is_empty() {
            let key: Vec<String> = self
                .primary_key
                .iter()
                .map(|name| quote_identifier(name))
                .collect();
            parts.push(format!("PRIMARY KEY ({})", key.join(", ")));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(&self.name),
            parts.join(", ")
        )
    }

    /// Appends `column` to an existing table; existing rows get null.
    pub fn add_column_statement(&self, column: &SchemaColumn) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote_identifier(&self.name),
            quote_identifier(&column.name),
            column.canonical
        )
    }

    /// Duplicate-tolerant insert template, parameters in column order.
    pub fn insert_statement(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect();
        let placeholders: Vec<String> = (1..=self.columns.len())
            .map(|index| format!("?{index}"))
            .collect();
        format!(
            "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
            quote_identifier(&self.name),
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}

/// Double-quotes an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, canonical: CanonicalType) -> SchemaColumn {
        SchemaColumn {
            name: name.to_string(),
            canonical,
        }
    }

    #[test]
    fn rejects_duplicate_columns() {
        let result = TableSchema::new(
            "T",
            vec![
                column("A", CanonicalType::Text),
                column("A", CanonicalType::Integer),
            ],
        );
        assert!(matches!(result, Err(ModelError::DuplicateColumn { .. })));
    }

    #[test]
    fn rejects_columns_differing_only_in_case() {
        let result = TableSchema::new(
            "T",
            vec![
                column("Flags", CanonicalType::Integer),
                column("flags", CanonicalType::Integer),
            ],
        );
        assert!(matches!(result, Err(ModelError::DuplicateColumn { .. })));
    }

    #[test]
    fn rejects_unknown_key_column() {
        let result = TableSchema::new("T", vec![column("A", CanonicalType::Text)])
            .and_then(|schema| schema.with_primary_key(["B"]));
        assert!(matches!(result, Err(ModelError::UnknownKeyColumn { .. })));
    }

    #[test]
    fn add_column_statement_quotes_names() {
        let schema = TableSchema::new("Wlan Profiles", vec![column("SSID", CanonicalType::Text)])
            .expect("schema");
        let added = column("Channel Hints", CanonicalType::Text);
        let statement = schema.add_column_statement(&added);
        assert_eq!(
            statement,
            r#"ALTER TABLE "Wlan Profiles" ADD COLUMN "Channel Hints" TEXT"#
        );
    }

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_identifier(r#"a"b"#), r#""a""b""#);
    }
}
