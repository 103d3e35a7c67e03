//! Tabular (ESE-style) source contract and an in-memory implementation.
//!
//! A reader exposes tables by identifier; each table has an ordered column
//! list and a one-shot sequence of records whose values are raw bytes or
//! null.

use srum_model::ColumnDescriptor;

use crate::error::{IngestError, Result};

/// One raw record: values by column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    values: Vec<Option<Vec<u8>>>,
}

impl RawRecord {
    pub fn new(values: Vec<Option<Vec<u8>>>) -> Self {
        Self { values }
    }

    /// Raw bytes at `index`; absent trailing values read as null.
    pub fn value(&self, index: usize) -> Option<&[u8]> {
        self.values.get(index).and_then(|value| value.as_deref())
    }
}

/// One table opened from a tabular source.
pub trait SourceTable {
    /// Source identifier of the table, before alias resolution.
    fn name(&self) -> &str;

    /// Ordered column list.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Records in storage order. The sequence is consumed once; a second
    /// call yields nothing.
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<RawRecord>> + '_>;
}

/// A database of tables.
pub trait TabularSource {
    /// Table identifiers in storage order.
    fn table_names(&self) -> Vec<String>;

    fn open_table(&self, name: &str) -> Result<Box<dyn SourceTable + '_>>;
}

/// A table held fully in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub records: Vec<RawRecord>,
    failure: Option<(usize, String)>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
            records: Vec::new(),
            failure: None,
        }
    }

    #[must_use]
    pub fn with_record(mut self, record: RawRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Makes the record at `index` unreadable, as a damaged page would.
    #[must_use]
    pub fn with_failure_at(mut self, index: usize, message: impl Into<String>) -> Self {
        self.failure = Some((index, message.into()));
        self
    }
}

/// In-memory tabular source, also the target of snapshot loading.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Vec<MemoryTable>,
}

impl MemoryDatabase {
    pub fn new(tables: Vec<MemoryTable>) -> Self {
        Self { tables }
    }

    pub fn push(&mut self, table: MemoryTable) {
        self.tables.push(table);
    }

    pub fn tables(&self) -> &[MemoryTable] {
        &self.tables
    }
}

impl TabularSource for MemoryDatabase {
    fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.name.clone()).collect()
    }

    fn open_table(&self, name: &str) -> Result<Box<dyn SourceTable + '_>> {
        let table = self
            .tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| IngestError::TableNotFound {
                table: name.to_string(),
            })?;
        Ok(Box::new(MemoryCursor {
            table,
            consumed: false,
        }))
    }
}

struct MemoryCursor<'a> {
    table: &'a MemoryTable,
    consumed: bool,
}

impl SourceTable for MemoryCursor<'_> {
    fn name(&self) -> &str {
        &self.table.name
    }

    fn columns(&self) -> &[ColumnDescriptor] {
        &self.table.columns
    }

    fn records(&mut self) -> Box<dyn Iterator<Item = Result<RawRecord>> + '_> {
        if self.consumed {
            return Box::new(std::iter::empty());
        }
        self.consumed = true;
        let table = self.table;
        Box::new(
            table
                .records
                .iter()
                .enumerate()
                .map(move |(index, record)| match &table.failure {
                    Some((at, message)) if *at == index => Err(IngestError::RecordRead {
                        table: table.name.clone(),
                        index,
                        message: message.clone(),
                    }),
                    _ => Ok(record.clone()),
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use srum_model::EseColumnType;

    use super::*;

    fn sample() -> MemoryDatabase {
        MemoryDatabase::new(vec![
            MemoryTable::new(
                "SruDbIdMapTable",
                vec![
                    ColumnDescriptor::new("IdType", EseColumnType::UInt8),
                    ColumnDescriptor::new("IdIndex", EseColumnType::Int32),
                ],
            )
            .with_record(RawRecord::new(vec![Some(vec![3]), Some(vec![1, 0, 0, 0])]))
            .with_record(RawRecord::new(vec![Some(vec![0])])),
        ])
    }

    #[test]
    fn records_are_consumed_once() {
        let db = sample();
        let mut table = db.open_table("SruDbIdMapTable").expect("open");
        assert_eq!(table.records().count(), 2);
        assert_eq!(table.records().count(), 0);
    }

    #[test]
    fn short_record_reads_null() {
        let db = sample();
        let mut table = db.open_table("SruDbIdMapTable").expect("open");
        let records: Vec<RawRecord> = table.records().map(|r| r.expect("record")).collect();
        assert_eq!(records[1].value(0), Some(&[0u8][..]));
        assert_eq!(records[1].value(1), None);
    }

    #[test]
    fn missing_table_is_reported() {
        let db = sample();
        assert!(matches!(
            db.open_table("missing"),
            Err(IngestError::TableNotFound { .. })
        ));
    }

    #[test]
    fn failure_surfaces_as_error() {
        let db = MemoryDatabase::new(vec![
            MemoryTable::new("T", vec![ColumnDescriptor::new("A", EseColumnType::UInt8)])
                .with_record(RawRecord::new(vec![Some(vec![1])]))
                .with_record(RawRecord::new(vec![Some(vec![2])]))
                .with_failure_at(1, "bad page"),
        ]);
        let mut table = db.open_table("T").expect("open");
        let results: Vec<_> = table.records().collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(IngestError::RecordRead { index: 1, .. })
        ));
    }
}
