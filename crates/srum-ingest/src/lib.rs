//! Source reading for SRUM normalization.
//!
//! The native ESE and registry hive parsers live outside this workspace.
//! This crate defines the contracts the decoding engine consumes, in-memory
//! sources implementing them, and loaders for JSON dumps of both formats.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use srum_ingest::{TabularSource, load_database_snapshot};
//!
//! let db = load_database_snapshot(Path::new("SRUDB.json"))?;
//! for name in db.table_names() {
//!     let table = db.open_table(&name)?;
//!     println!("{} has {} columns", table.name(), table.columns().len());
//! }
//! ```

mod error;
mod registry;
mod snapshot;
mod tabular;

// === Error Types ===
pub use error::{IngestError, Result};

// === Tabular Sources ===
pub use tabular::{MemoryDatabase, MemoryTable, RawRecord, SourceTable, TabularSource};

// === Hierarchical Sources ===
pub use registry::{MemoryHive, MemoryKey, RegistryHive, RegistryKey, RegistryValue};

// === Snapshot Loading ===
pub use snapshot::{load_database_snapshot, load_hive_snapshot};
