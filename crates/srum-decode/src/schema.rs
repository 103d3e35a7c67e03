//! Destination schema derivation.
//!
//! A column's canonical type resolves, in order, from a declared type for
//! the destination table, from the type its decode rule always produces,
//! and finally from the type map.

use std::collections::BTreeMap;

use srum_model::{CanonicalType, ColumnDescriptor, SchemaColumn, TableSchema};
use tracing::debug;

use crate::error::ConfigError;
use crate::rules::RuleSet;
use crate::type_map::TypeMap;

/// Column used as primary key whenever a table has it.
pub const AUTO_INCREMENT_COLUMN: &str = "AutoIncId";

/// Everything needed to process one source table, fixed before any of its
/// records are read.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePlan {
    /// Identifier in the source database.
    pub source: String,
    /// Source columns, in record order.
    pub columns: Vec<ColumnDescriptor>,
    pub schema: TableSchema,
}

impl TablePlan {
    pub fn destination(&self) -> &str {
        &self.schema.name
    }
}

#[derive(Debug, Clone)]
pub struct SchemaBuilder<'a> {
    type_map: &'a TypeMap,
    rules: &'a RuleSet,
    declared: BTreeMap<String, CanonicalType>,
    primary_key: Option<Vec<String>>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(type_map: &'a TypeMap, rules: &'a RuleSet) -> Self {
        Self {
            type_map,
            rules,
            declared: BTreeMap::new(),
            primary_key: None,
        }
    }

    /// Column types that take precedence over rules and the type map.
    #[must_use]
    pub fn with_declared_types<I, S>(mut self, declared: I) -> Self
    where
        I: IntoIterator<Item = (S, CanonicalType)>,
        S: Into<String>,
    {
        self.declared
            .extend(declared.into_iter().map(|(name, ty)| (name.into(), ty)));
        self
    }

    /// Fixed primary key instead of the `AutoIncId` default.
    #[must_use]
    pub fn with_primary_key<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(key.into_iter().map(Into::into).collect());
        self
    }

    pub fn declared_type(&self, column: &str) -> Option<CanonicalType> {
        self.declared.get(column).copied()
    }

    /// Canonical type of `column` in destination table `table`.
    pub fn resolve_type(
        &self,
        table: &str,
        column: &ColumnDescriptor,
    ) -> Result<CanonicalType, ConfigError> {
        let rule = self.rules.resolve(table, &column.name);
        let mapped = self.type_map.canonical(column.native_type);
        if mapped == Some(CanonicalType::DateTime) && rule.is_none() {
            return Err(ConfigError::MissingDatetimeRule {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
        self.declared_type(&column.name)
            .or_else(|| rule.and_then(|rule| rule.strategy.canonical_override()))
            .or(mapped)
            .ok_or_else(|| ConfigError::UnmappedType {
                table: table.to_string(),
                column: column.name.clone(),
                native: column.native_type,
            })
    }

    /// Builds the destination schema for a fixed column list, validating
    /// sibling dependencies first.
    pub fn build(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<TableSchema, ConfigError> {
        self.rules.validate_columns(table, columns)?;
        let columns = columns
            .iter()
            .map(|column| {
                Ok(SchemaColumn {
                    name: column.name.clone(),
                    canonical: self.resolve_type(table, column)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        self.finish(table, columns)
    }

    /// Builds a schema from columns whose types are already known, as the
    /// registry walk discovers them. Declared types still win.
    pub fn build_discovered(
        &self,
        table: &str,
        columns: &[SchemaColumn],
    ) -> Result<TableSchema, ConfigError> {
        let columns = columns
            .iter()
            .map(|column| SchemaColumn {
                name: column.name.clone(),
                canonical: self.declared_type(&column.name).unwrap_or(column.canonical),
            })
            .collect();
        self.finish(table, columns)
    }

    /// Plans one source table: resolved destination name plus schema.
    pub fn plan(
        &self,
        source: &str,
        destination: &str,
        columns: Vec<ColumnDescriptor>,
    ) -> Result<TablePlan, ConfigError> {
        let schema = self.build(destination, &columns)?;
        debug!(
            source = %source,
            destination = %destination,
            columns = schema.len(),
            primary_key = ?schema.primary_key,
            "Planned table"
        );
        Ok(TablePlan {
            source: source.to_string(),
            columns,
            schema,
        })
    }

    fn finish(&self, table: &str, columns: Vec<SchemaColumn>) -> Result<TableSchema, ConfigError> {
        let schema = TableSchema::new(table, columns)?;
        let key = match &self.primary_key {
            Some(key) => key.clone(),
            None if schema.column(AUTO_INCREMENT_COLUMN).is_some() => {
                vec![AUTO_INCREMENT_COLUMN.to_string()]
            }
            None => Vec::new(),
        };
        schema.with_primary_key(key).map_err(ConfigError::from)
    }
}
