//! Typed record decoding and schema mapping for SRUM normalization.
//!
//! This crate turns raw ESE records and registry values into typed rows:
//!
//! - **Type maps** translate native type tags to canonical storage types
//! - **Decode rules** override type-driven decoding by column name
//! - **Timestamp codecs** handle OLE Automation Dates and FILETIMEs
//! - **Table name resolution** maps GUID table identifiers to names
//! - **Schema building** fixes column order and types before rows are read
//! - **Profile walking** flattens WLAN profiles into one sparse row each
//!
//! # Example
//!
//! ```ignore
//! use srum_decode::{RecordDecoder, RuleSet, SchemaBuilder, TableNameResolver, TypeMap};
//!
//! let type_map = TypeMap::ese()?;
//! let rules = RuleSet::srum_defaults()?;
//! let destination = TableNameResolver::default().resolve(table.name());
//! let plan = SchemaBuilder::new(&type_map, &rules).plan(table.name(), &destination, columns)?;
//! let decoder = RecordDecoder::new(&type_map, &rules);
//! for record in table.records() {
//!     let outcome = decoder.decode_record(plan.destination(), &plan.columns, &record?)?;
//! }
//! ```

pub mod blob;
pub mod context;
pub mod datetime;
pub mod decoder;
pub mod error;
pub mod profiles;
pub mod rules;
pub mod schema;
pub mod table_name;
pub mod type_map;

// === Error Types ===
pub use error::{ConfigError, DecodeError, FieldDecodeError, Result};

// === Configuration ===
pub use rules::{BlobKind, DecodeRule, DecodeStrategy, RuleScope, RuleSet, SiblingPredicate};
pub use table_name::{DEFAULT_ALIASES, TableNameResolver, is_guid_shaped};
pub use type_map::TypeMap;

// === Decoding ===
pub use context::{DecodeOutcome, FieldFailure, RecordContext};
pub use datetime::{ole_automation_date, windows_filetime};
pub use decoder::{RecordDecoder, decode_numeric, decode_utf16le};

// === Schema ===
pub use profiles::{
    ColumnAccumulator, INTERFACES_PATH, ProfileCollection, ProfileWalker, WLAN_DECLARED_TYPES,
    WLAN_PROFILE_TABLE,
};
pub use schema::{AUTO_INCREMENT_COLUMN, SchemaBuilder, TablePlan};
