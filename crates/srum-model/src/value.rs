//! Decoded values and rows.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::enums::CanonicalType;

/// Fixed output format for every decoded timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// UTC-naive point in time, rendered with [`TIMESTAMP_FORMAT`].
    Timestamp(NaiveDateTime),
    /// Several named fields produced by one structured decode.
    Fields(Vec<(String, DecodedValue)>),
}

impl DecodedValue {
    pub fn text(value: impl Into<String>) -> Self {
        DecodedValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DecodedValue::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DecodedValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Canonical storage kind of this value, `None` for nulls.
    ///
    /// Structured fields are stored as JSON text when they cannot be
    /// flattened into the row.
    pub fn canonical_type(&self) -> Option<CanonicalType> {
        match self {
            DecodedValue::Null => None,
            DecodedValue::Integer(_) => Some(CanonicalType::Integer),
            DecodedValue::Real(_) => Some(CanonicalType::Real),
            DecodedValue::Text(_) | DecodedValue::Fields(_) => Some(CanonicalType::Text),
            DecodedValue::Bytes(_) => Some(CanonicalType::Blob),
            DecodedValue::Timestamp(_) => Some(CanonicalType::DateTime),
        }
    }

    /// Timestamp rendered in the fixed output format.
    pub fn format_timestamp(value: &NaiveDateTime) -> String {
        value.format(TIMESTAMP_FORMAT).to_string()
    }

    /// JSON rendering, used for structured fields and log output.
    pub fn to_json(&self) -> Value {
        match self {
            DecodedValue::Null => Value::Null,
            DecodedValue::Integer(value) => Value::from(*value),
            DecodedValue::Real(value) => Value::from(*value),
            DecodedValue::Text(value) => Value::from(value.as_str()),
            DecodedValue::Bytes(bytes) => Value::from(hex::encode(bytes)),
            DecodedValue::Timestamp(value) => Value::from(Self::format_timestamp(value)),
            DecodedValue::Fields(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

/// One decoded source record, keyed by column name.
///
/// Column names compare ASCII case-insensitively, as SQLite identifiers do;
/// the first spelling inserted is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRow {
    values: BTreeMap<String, (String, DecodedValue)>,
}

impl DecodedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: DecodedValue) {
        let column = column.into();
        match self.values.entry(column.to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => entry.get_mut().1 = value,
            Entry::Vacant(entry) => {
                entry.insert((column, value));
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&DecodedValue> {
        self.values
            .get(&column.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Value for `column`, treating absent columns as null.
    pub fn value_or_null(&self, column: &str) -> &DecodedValue {
        self.get(column).unwrap_or(&DecodedValue::Null)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(&column.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedValue)> {
        self.values
            .values()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Merges the fields of a structured value into the row instead of
    /// nesting them; any other value is stored under `column`.
    pub fn merge(&mut self, column: &str, value: DecodedValue) -> Vec<String> {
        match value {
            DecodedValue::Fields(fields) => {
                let mut names = Vec::with_capacity(fields.len());
                for (name, field) in fields {
                    names.push(name.clone());
                    self.insert(name, field);
                }
                names
            }
            other => {
                self.insert(column, other);
                vec![column.to_string()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn merge_flattens_fields() {
        let mut row = DecodedRow::new();
        let names = row.merge(
            "Channel Hints",
            DecodedValue::Fields(vec![
                ("NameLength".to_string(), DecodedValue::Integer(4)),
                ("Name".to_string(), DecodedValue::text("test")),
            ]),
        );
        assert_eq!(names, vec!["NameLength", "Name"]);
        assert!(!row.contains("Channel Hints"));
        assert_eq!(row.get("NameLength"), Some(&DecodedValue::Integer(4)));
    }

    #[test]
    fn column_names_ignore_ascii_case() {
        let mut row = DecodedRow::new();
        row.insert("Flags", DecodedValue::Integer(1));
        row.insert("flags", DecodedValue::Integer(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("FLAGS"), Some(&DecodedValue::Integer(2)));
        let names: Vec<_> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Flags"]);
    }

    #[test]
    fn timestamp_renders_microseconds() {
        let value = NaiveDate::from_ymd_opt(1601, 1, 1)
            .and_then(|d| d.and_hms_micro_opt(0, 0, 0, 1))
            .expect("valid date");
        assert_eq!(
            DecodedValue::format_timestamp(&value),
            "1601-01-01 00:00:00.000001"
        );
    }

    #[test]
    fn fields_render_as_json_object() {
        let value = DecodedValue::Fields(vec![
            ("NameLength".to_string(), DecodedValue::Integer(2)),
            ("SSID".to_string(), DecodedValue::text("00ff")),
        ]);
        assert_eq!(
            value.to_json().to_string(),
            r#"{"NameLength":2,"SSID":"00ff"}"#
        );
    }
}
