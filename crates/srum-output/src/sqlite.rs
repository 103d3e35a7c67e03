//! SQLite destination.
//!
//! One connection per run. Each table is created and written inside its own
//! transaction with duplicate-tolerant inserts and committed once all of
//! its rows were submitted. A table kept from an earlier run gains the
//! columns its schema has since grown.

use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{Connection, Transaction, params_from_iter};
use serde_json::Map;
use srum_model::{DecodedRow, DecodedValue, TableSchema};
use tracing::{debug, error, info};

use crate::error::{OutputError, Result};

/// Default bound on waiting for a locked database.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// How the destination is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub busy_timeout: Duration,
    /// Delete an existing file first.
    pub overwrite: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            overwrite: true,
        }
    }
}

/// Row counts for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub inserted: usize,
    /// Rows skipped because their key already existed.
    pub duplicates: usize,
    /// Rows rejected for any other reason.
    pub failed: usize,
}

impl WriteStats {
    pub fn submitted(&self) -> usize {
        self.inserted + self.duplicates + self.failed
    }
}

impl AddAssign for WriteStats {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
    }
}

/// What happened to one submitted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
    Failed,
}

pub struct SqliteOutput {
    connection: Connection,
    path: Option<PathBuf>,
}

impl SqliteOutput {
    /// Opens (and by default recreates) the destination file.
    pub fn open(path: &Path, options: &OutputOptions) -> Result<Self> {
        if options.overwrite && path.exists() {
            std::fs::remove_file(path).map_err(|source| OutputError::RemoveExisting {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "Removed existing output database");
        }
        let connection = Connection::open(path).map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        connection
            .busy_timeout(options.busy_timeout)
            .map_err(OutputError::Configure)?;
        debug!(
            path = %path.display(),
            busy_timeout = ?options.busy_timeout,
            "Opened output database"
        );
        Ok(Self {
            connection,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory destination, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(|source| OutputError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self {
            connection,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Starts the transaction for one table and creates the table inside it,
    /// so a rollback leaves no trace of the table.
    pub fn begin_table<'a>(&'a mut self, schema: &'a TableSchema) -> Result<TableWriter<'a>> {
        let transaction =
            self.connection
                .transaction()
                .map_err(|source| OutputError::Transaction {
                    table: schema.name.clone(),
                    source,
                })?;
        ensure_table(&transaction, schema)?;
        Ok(TableWriter {
            transaction,
            schema,
            sql: schema.insert_statement(),
            stats: WriteStats::default(),
        })
    }

    /// Creates `schema`, inserts every row and commits.
    pub fn write_table<'r, I>(&mut self, schema: &TableSchema, rows: I) -> Result<WriteStats>
    where
        I: IntoIterator<Item = &'r DecodedRow>,
    {
        let mut writer = self.begin_table(schema)?;
        for row in rows {
            writer.insert(row);
        }
        writer.commit()
    }
}

/// Inserts rows of one table inside a transaction.
pub struct TableWriter<'a> {
    transaction: Transaction<'a>,
    schema: &'a TableSchema,
    sql: String,
    stats: WriteStats,
}

impl TableWriter<'_> {
    /// Inserts `row` in schema column order; absent columns are null.
    ///
    /// Key conflicts are skipped quietly. Other failures are logged with the
    /// statement and the row and do not stop the table.
    pub fn insert(&mut self, row: &DecodedRow) -> InsertOutcome {
        let values: Vec<Value> = self
            .schema
            .column_names()
            .map(|name| to_sql_value(row.value_or_null(name)))
            .collect();
        let result = self
            .transaction
            .prepare_cached(&self.sql)
            .and_then(|mut statement| statement.execute(params_from_iter(values)));
        match result {
            Ok(0) => {
                debug!(table = %self.schema.name, "Duplicate row skipped");
                self.stats.duplicates += 1;
                InsertOutcome::Duplicate
            }
            Ok(_) => {
                self.stats.inserted += 1;
                InsertOutcome::Inserted
            }
            Err(source) => {
                error!(
                    table = %self.schema.name,
                    sql = %self.sql,
                    row = %row_json(row),
                    error = %source,
                    "Row insert failed"
                );
                self.stats.failed += 1;
                InsertOutcome::Failed
            }
        }
    }

    pub fn commit(self) -> Result<WriteStats> {
        let table = self.schema.name.clone();
        self.transaction
            .commit()
            .map_err(|source| OutputError::Transaction { table, source })?;
        debug!(
            table = %self.schema.name,
            inserted = self.stats.inserted,
            duplicates = self.stats.duplicates,
            failed = self.stats.failed,
            "Committed table"
        );
        Ok(self.stats)
    }

    /// Discards every row of this table.
    pub fn rollback(self) -> Result<WriteStats> {
        let table = self.schema.name.clone();
        self.transaction
            .rollback()
            .map_err(|source| OutputError::Transaction { table, source })?;
        debug!(table = %self.schema.name, "Rolled back table");
        Ok(self.stats)
    }
}

fn ensure_table(connection: &Connection, schema: &TableSchema) -> Result<()> {
    let sql = schema.create_statement();
    connection
        .execute(&sql, [])
        .map_err(|source| OutputError::CreateTable {
            table: schema.name.clone(),
            sql: sql.clone(),
            source,
        })?;
    debug!(table = %schema.name, sql = %sql, "Created table");

    let existing = existing_columns(connection, &schema.name)?;
    let missing = schema.columns.iter().filter(|column| {
        !existing
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&column.name))
    });
    for column in missing {
        let sql = schema.add_column_statement(column);
        connection
            .execute(&sql, [])
            .map_err(|source| OutputError::AlterTable {
                table: schema.name.clone(),
                sql: sql.clone(),
                source,
            })?;
        info!(table = %schema.name, column = %column.name, "Added column to existing table");
    }
    Ok(())
}

fn existing_columns(connection: &Connection, table: &str) -> Result<Vec<String>> {
    let inspect = |source: rusqlite::Error| OutputError::InspectTable {
        table: table.to_string(),
        source,
    };
    let mut statement = connection
        .prepare_cached("SELECT name FROM pragma_table_info(?1)")
        .map_err(inspect)?;
    let names = statement
        .query_map([table], |row| row.get::<_, String>(0))
        .and_then(Iterator::collect::<rusqlite::Result<Vec<_>>>)
        .map_err(inspect)?;
    Ok(names)
}

/// Storage form of a decoded value.
pub fn to_sql_value(value: &DecodedValue) -> Value {
    match value {
        DecodedValue::Null => Value::Null,
        DecodedValue::Integer(value) => Value::Integer(*value),
        DecodedValue::Real(value) => Value::Real(*value),
        DecodedValue::Text(value) => Value::Text(value.clone()),
        DecodedValue::Bytes(value) => Value::Blob(value.clone()),
        DecodedValue::Timestamp(value) => Value::Text(DecodedValue::format_timestamp(value)),
        DecodedValue::Fields(_) => Value::Text(value.to_json().to_string()),
    }
}

fn row_json(row: &DecodedRow) -> serde_json::Value {
    let mut map = Map::new();
    for (name, value) in row.iter() {
        map.insert(name.to_string(), value.to_json());
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_stored_as_json_text() {
        let value = DecodedValue::Fields(vec![("NameLength".to_string(), DecodedValue::Integer(4))]);
        assert_eq!(
            to_sql_value(&value),
            Value::Text(r#"{"NameLength":4}"#.to_string())
        );
    }

    #[test]
    fn stats_accumulate() {
        let mut total = WriteStats::default();
        total += WriteStats {
            inserted: 2,
            duplicates: 1,
            failed: 0,
        };
        total += WriteStats {
            inserted: 1,
            duplicates: 0,
            failed: 1,
        };
        assert_eq!(total.submitted(), 5);
        assert_eq!(total.inserted, 3);
    }
}
