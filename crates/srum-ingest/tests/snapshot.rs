//! Tests for loading JSON dumps.

use std::io::Write;

use srum_ingest::{
    IngestError, RegistryHive, RegistryKey, TabularSource, load_database_snapshot,
    load_hive_snapshot,
};
use srum_model::{EseColumnType, NativeType, RegistryValueType};
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write");
    file
}

#[test]
fn loads_database_tables_and_records() {
    let file = write_temp(
        r#"{"tables": [{
            "name": "SruDbIdMapTable",
            "columns": [
                {"name": "IdType", "type": 2},
                {"name": "IdIndex", "type": 4},
                {"name": "IdBlob", "type": 11}
            ],
            "records": [
                ["00", "01000000", "6100620000"],
                ["03", "02000000", null]
            ]
        }]}"#,
    );
    let db = load_database_snapshot(file.path()).expect("load");
    assert_eq!(db.table_names(), vec!["SruDbIdMapTable".to_string()]);

    let mut table = db.open_table("SruDbIdMapTable").expect("open");
    assert_eq!(
        table.columns()[2].native_type,
        NativeType::Ese(EseColumnType::LargeBinary)
    );
    let records: Vec<_> = table
        .records()
        .map(|record| record.expect("record"))
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].value(1), Some(&[1u8, 0, 0, 0][..]));
    assert_eq!(records[1].value(2), None);
}

#[test]
fn unknown_type_tag_is_preserved() {
    let file = write_temp(
        r#"{"tables": [{"name": "T", "columns": [{"name": "A", "type": 99}], "records": []}]}"#,
    );
    let db = load_database_snapshot(file.path()).expect("load");
    assert_eq!(
        db.tables()[0].columns[0].native_type,
        NativeType::Ese(EseColumnType::Unknown(99))
    );
}

#[test]
fn loads_hive_tree() {
    let file = write_temp(
        r#"{"root": {"name": "ROOT", "subkeys": [
            {"name": "Microsoft", "subkeys": [
                {"name": "WlanSvc", "subkeys": [
                    {"name": "Interfaces", "subkeys": [
                        {"name": "{A1B2}", "values": [
                            {"name": "ProfileIndex", "type": 4, "data": "02000000"}
                        ]}
                    ]}
                ]}
            ]}
        ]}}"#,
    );
    let hive = load_hive_snapshot(file.path()).expect("load");
    let interfaces = hive.open("Microsoft\\WlanSvc\\Interfaces").expect("open");
    let children = interfaces.subkeys().expect("subkeys");
    assert_eq!(children.len(), 1);
    let values = children[0].values().expect("values");
    assert_eq!(values[0].value_type, RegistryValueType::Dword);
    assert_eq!(values[0].data, vec![2, 0, 0, 0]);
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = load_database_snapshot(&dir.path().join("missing.json"));
    assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
}

#[test]
fn malformed_json_is_reported() {
    let file = write_temp("{not json");
    let result = load_hive_snapshot(file.path());
    assert!(matches!(result, Err(IngestError::SnapshotParse { .. })));
}

#[test]
fn invalid_hex_is_reported() {
    let file = write_temp(
        r#"{"tables": [{"name": "T", "columns": [{"name": "A", "type": 2}], "records": [["xyz"]]}]}"#,
    );
    let result = load_database_snapshot(file.path());
    assert!(matches!(result, Err(IngestError::InvalidHex { .. })));
}
