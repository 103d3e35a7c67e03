//! Tests for srum-model types.

use srum_model::{CanonicalType, DecodedValue, SchemaColumn, TableSchema};

fn profile_schema() -> TableSchema {
    TableSchema::new(
        "WlanSvcInterfaceProfiles",
        vec![
            SchemaColumn {
                name: "InterfaceGuid".to_string(),
                canonical: CanonicalType::Text,
            },
            SchemaColumn {
                name: "ProfileGuid".to_string(),
                canonical: CanonicalType::Text,
            },
            SchemaColumn {
                name: "All User Profile Security Descriptor".to_string(),
                canonical: CanonicalType::Text,
            },
            SchemaColumn {
                name: "ProfileIndex".to_string(),
                canonical: CanonicalType::Integer,
            },
        ],
    )
    .expect("schema")
    .with_primary_key(["InterfaceGuid", "ProfileGuid"])
    .expect("primary key")
}

#[test]
fn create_statement_snapshot() {
    let schema = profile_schema();
    insta::assert_snapshot!(
        schema.create_statement(),
        @r#"CREATE TABLE IF NOT EXISTS "WlanSvcInterfaceProfiles" ("InterfaceGuid" TEXT, "ProfileGuid" TEXT, "All User Profile Security Descriptor" TEXT, "ProfileIndex" INTEGER, PRIMARY KEY ("InterfaceGuid", "ProfileGuid"))"#
    );
}

#[test]
fn insert_statement_snapshot() {
    let schema = profile_schema();
    insta::assert_snapshot!(
        schema.insert_statement(),
        @r#"INSERT OR IGNORE INTO "WlanSvcInterfaceProfiles" ("InterfaceGuid", "ProfileGuid", "All User Profile Security Descriptor", "ProfileIndex") VALUES (?1, ?2, ?3, ?4)"#
    );
}

#[test]
fn statements_share_column_order() {
    let schema = profile_schema();
    let create = schema.create_statement();
    let insert = schema.insert_statement();
    let mut last_create = 0;
    let mut last_insert = 0;
    for name in schema.column_names() {
        let quoted = format!("\"{name}\"");
        let in_create = create.find(&quoted).expect("column in create");
        let in_insert = insert.find(&quoted).expect("column in insert");
        assert!(in_create >= last_create);
        assert!(in_insert >= last_insert);
        last_create = in_create;
        last_insert = in_insert;
    }
}

#[test]
fn schema_without_key_has_no_constraint() {
    let schema = TableSchema::new(
        "SruDbIdMapTable",
        vec![SchemaColumn {
            name: "IdType".to_string(),
            canonical: CanonicalType::Integer,
        }],
    )
    .expect("schema");
    assert!(!schema.create_statement().contains("PRIMARY KEY"));
}

#[test]
fn value_canonical_types() {
    assert_eq!(DecodedValue::Null.canonical_type(), None);
    assert_eq!(
        DecodedValue::Integer(1).canonical_type(),
        Some(CanonicalType::Integer)
    );
    assert_eq!(
        DecodedValue::Bytes(vec![1]).canonical_type(),
        Some(CanonicalType::Blob)
    );
}
