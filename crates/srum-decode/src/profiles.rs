//! WLAN profile collection from the SOFTWARE hive.
//!
//! The profile tree is walked in full before anything is written: each
//! profile becomes one sparse row and every field name seen is kept in
//! first-seen order. The schema is built from that list afterwards and rows
//! missing a field get null for it.

use srum_ingest::{RegistryHive, RegistryKey, RegistryValue};
use srum_model::{
    CanonicalType, ColumnDescriptor, DecodedRow, DecodedValue, SchemaColumn, TableSchema,
};
use tracing::{debug, info_span};

use crate::blob::blob_fields;
use crate::context::{FieldFailure, RecordContext};
use crate::decoder::RecordDecoder;
use crate::error::{ConfigError, Result};
use crate::rules::{DecodeStrategy, RuleSet};
use crate::schema::SchemaBuilder;
use crate::type_map::TypeMap;

/// Destination table for flattened profiles.
pub const WLAN_PROFILE_TABLE: &str = "WlanSvcInterfaceProfiles";

/// Key holding one subkey per wireless interface.
pub const INTERFACES_PATH: &str = "Microsoft\\WlanSvc\\Interfaces";

pub const INTERFACE_GUID_COLUMN: &str = "InterfaceGuid";
pub const PROFILE_GUID_COLUMN: &str = "ProfileGuid";

const PROFILES_KEY: &str = "Profiles";
const METADATA_KEY: &str = "MetaData";

/// Column types fixed for the profile table regardless of value types.
pub const WLAN_DECLARED_TYPES: &[(&str, CanonicalType)] = &[
    ("ProfileIndex", CanonicalType::Integer),
    ("succeeded", CanonicalType::Blob),
    ("ProfileGuid", CanonicalType::Text),
    ("Flags", CanonicalType::Integer),
    ("All User Profile Security Descriptor", CanonicalType::Text),
    ("CreatorSid", CanonicalType::Blob),
    ("InterfaceGuid", CanonicalType::Text),
    ("SSID", CanonicalType::Text),
    ("Nla", CanonicalType::Blob),
    ("NameLength", CanonicalType::Integer),
    ("Name", CanonicalType::Text),
];

/// Field names in first-seen order, each with the type of its first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnAccumulator {
    columns: Vec<SchemaColumn>,
}

impl ColumnAccumulator {
    /// Records `name` unless already seen under any ASCII casing; later
    /// spellings and types do not replace the first ones.
    pub fn observe(&mut self, name: &str, canonical: CanonicalType) {
        if !self
            .columns
            .iter()
            .any(|column| column.name.eq_ignore_ascii_case(name))
        {
            self.columns.push(SchemaColumn {
                name: name.to_string(),
                canonical,
            });
        }
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// All profile rows of one hive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCollection {
    pub columns: ColumnAccumulator,
    pub rows: Vec<DecodedRow>,
    pub failures: Vec<FieldFailure>,
    pub interfaces: usize,
}

/// Walks interface and profile keys, decoding values with the registry
/// type map and rules.
#[derive(Debug, Clone)]
pub struct ProfileWalker<'a> {
    rules: &'a RuleSet,
    decoder: RecordDecoder<'a>,
    schema: SchemaBuilder<'a>,
}

impl<'a> ProfileWalker<'a> {
    pub fn new(type_map: &'a TypeMap, rules: &'a RuleSet) -> Self {
        Self {
            rules,
            decoder: RecordDecoder::new(type_map, rules),
            schema: SchemaBuilder::new(type_map, rules)
                .with_declared_types(WLAN_DECLARED_TYPES.iter().copied())
                .with_primary_key([INTERFACE_GUID_COLUMN, PROFILE_GUID_COLUMN]),
        }
    }

    /// First pass: collects every profile under [`INTERFACES_PATH`].
    pub fn collect<H: RegistryHive>(&self, hive: &H) -> Result<ProfileCollection> {
        let span = info_span!("registry", table = WLAN_PROFILE_TABLE);
        let _guard = span.enter();

        let mut collection = ProfileCollection::default();
        let interfaces = hive.open(INTERFACES_PATH)?;
        for interface in interfaces.subkeys()? {
            if interface.subkeys()?.is_empty() {
                debug!(interface = %interface.name(), "Interface has no subkeys, skipping");
                continue;
            }
            let Some(profiles) = interface.subkey(PROFILES_KEY)? else {
                debug!(interface = %interface.name(), "Interface has no Profiles key, skipping");
                continue;
            };
            collection.interfaces += 1;
            for profile in profiles.subkeys()? {
                self.collect_profile(interface.name(), &profile, &mut collection)?;
            }
        }
        debug!(
            interfaces = collection.interfaces,
            profiles = collection.rows.len(),
            columns = collection.columns.len(),
            "Collected WLAN profiles"
        );
        Ok(collection)
    }

    /// Second pass: schema from the union of observed fields.
    pub fn schema(
        &self,
        collection: &ProfileCollection,
    ) -> std::result::Result<TableSchema, ConfigError> {
        self.schema
            .build_discovered(WLAN_PROFILE_TABLE, collection.columns.columns())
    }

    fn collect_profile<K: RegistryKey>(
        &self,
        interface_guid: &str,
        profile: &K,
        collection: &mut ProfileCollection,
    ) -> Result<()> {
        let mut context = RecordContext::new(WLAN_PROFILE_TABLE);
        for (column, value) in [
            (INTERFACE_GUID_COLUMN, interface_guid),
            (PROFILE_GUID_COLUMN, profile.name()),
        ] {
            collection.columns.observe(column, CanonicalType::Text);
            context.insert(column, DecodedValue::text(value));
        }

        for value in profile.values()? {
            self.merge_value(&value, &mut context, &mut collection.columns)?;
        }
        if let Some(metadata) = profile.subkey(METADATA_KEY)? {
            for value in metadata.values()? {
                self.merge_value(&value, &mut context, &mut collection.columns)?;
            }
        }

        let outcome = context.into_outcome();
        collection.rows.push(outcome.row);
        collection.failures.extend(outcome.failures);
        Ok(())
    }

    fn merge_value(
        &self,
        value: &RegistryValue,
        context: &mut RecordContext<'_>,
        columns: &mut ColumnAccumulator,
    ) -> Result<()> {
        let column = ColumnDescriptor::new(&value.name, value.value_type);
        let decoded = self.decoder.decode_field(&column, Some(&value.data), context)?;
        let blob = self
            .rules
            .resolve(WLAN_PROFILE_TABLE, &value.name)
            .and_then(|rule| match rule.strategy {
                DecodeStrategy::StructuredBlob(kind) => Some(kind),
                _ => None,
            });
        match (&decoded, blob) {
            (DecodedValue::Fields(fields), _) => {
                for (name, field) in fields {
                    columns.observe(name, self.field_type(name, field.canonical_type()));
                }
            }
            // The failure is already recorded; the blob's fields stay null.
            (_, Some(kind)) => {
                for (name, canonical) in blob_fields(kind) {
                    columns.observe(name, self.field_type(name, Some(*canonical)));
                }
                return Ok(());
            }
            (_, None) => {
                let canonical = self.schema.resolve_type(WLAN_PROFILE_TABLE, &column)?;
                columns.observe(&value.name, canonical);
            }
        }
        context.merge(&value.name, decoded);
        Ok(())
    }

    fn field_type(&self, name: &str, observed: Option<CanonicalType>) -> CanonicalType {
        self.schema
            .declared_type(name)
            .or(observed)
            .unwrap_or(CanonicalType::Text)
    }
}
