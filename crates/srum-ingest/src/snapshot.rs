//! Loading exported SRUM database and SOFTWARE hive dumps.
//!
//! Snapshots are JSON documents produced by an external ESE/registry
//! exporter. Raw bytes are hex encoded, type tags are the numeric values
//! the native readers report.
//!
//! Database layout:
//!
//! ```json
//! {"tables": [{"name": "SruDbIdMapTable",
//!              "columns": [{"name": "IdType", "type": 2}],
//!              "records": [["03"], [null]]}]}
//! ```
//!
//! Hive layout:
//!
//! ```json
//! {"root": {"name": "ROOT",
//!           "subkeys": [],
//!           "values": [{"name": "Flags", "type": 4, "data": "01000000"}]}}
//! ```

use std::path::Path;

use serde::Deserialize;
use srum_model::{ColumnDescriptor, EseColumnType, RegistryValueType};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::registry::{MemoryHive, MemoryKey, RegistryValue};
use crate::tabular::{MemoryDatabase, MemoryTable, RawRecord};

#[derive(Debug, Deserialize)]
struct DatabaseSnapshot {
    #[serde(default)]
    tables: Vec<TableSnapshot>,
}

#[derive(Debug, Deserialize)]
struct TableSnapshot {
    name: String,
    #[serde(default)]
    columns: Vec<ColumnSnapshot>,
    #[serde(default)]
    records: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
struct ColumnSnapshot {
    name: String,
    #[serde(rename = "type")]
    tag: u32,
}

#[derive(Debug, Deserialize)]
struct HiveSnapshot {
    root: KeySnapshot,
}

#[derive(Debug, Deserialize)]
struct KeySnapshot {
    name: String,
    #[serde(default)]
    subkeys: Vec<KeySnapshot>,
    #[serde(default)]
    values: Vec<ValueSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ValueSnapshot {
    name: String,
    #[serde(rename = "type")]
    tag: u32,
    #[serde(default)]
    data: String,
}

/// Loads a tabular database dump into memory.
pub fn load_database_snapshot(path: &Path) -> Result<MemoryDatabase> {
    let snapshot: DatabaseSnapshot = read_json(path)?;
    let mut database = MemoryDatabase::default();
    for table in snapshot.tables {
        let columns = table
            .columns
            .iter()
            .map(|column| ColumnDescriptor::new(&column.name, EseColumnType::from_tag(column.tag)))
            .collect();
        let mut memory = MemoryTable::new(&table.name, columns);
        for (index, record) in table.records.into_iter().enumerate() {
            let values = record
                .into_iter()
                .enumerate()
                .map(|(column, value)| {
                    value
                        .map(|hex_data| {
                            decode_hex(&hex_data, || {
                                format!("table {} record {index} column {column}", table.name)
                            })
                        })
                        .transpose()
                })
                .collect::<Result<Vec<_>>>()?;
            memory.records.push(RawRecord::new(values));
        }
        debug!(
            table = %memory.name,
            columns = memory.columns.len(),
            records = memory.records.len(),
            "Loaded table snapshot"
        );
        database.push(memory);
    }
    Ok(database)
}

/// Loads a registry hive dump into memory.
pub fn load_hive_snapshot(path: &Path) -> Result<MemoryHive> {
    let snapshot: HiveSnapshot = read_json(path)?;
    let root = convert_key(snapshot.root, "")?;
    Ok(MemoryHive::new(root))
}

fn convert_key(snapshot: KeySnapshot, parent: &str) -> Result<MemoryKey> {
    let path = if parent.is_empty() {
        snapshot.name.clone()
    } else {
        format!("{parent}\\{}", snapshot.name)
    };
    let mut key = MemoryKey::new(snapshot.name);
    for value in snapshot.values {
        let data = decode_hex(&value.data, || format!("{path} value {}", value.name))?;
        key.values.push(RegistryValue::new(
            value.name,
            RegistryValueType::from_tag(value.tag),
            data,
        ));
    }
    for child in snapshot.subkeys {
        key.subkeys.push(convert_key(child, &path)?);
    }
    Ok(key)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|e| IngestError::SnapshotParse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn decode_hex(data: &str, location: impl FnOnce() -> String) -> Result<Vec<u8>> {
    hex::decode(data.trim()).map_err(|e| IngestError::InvalidHex {
        location: location(),
        source: e,
    })
}
