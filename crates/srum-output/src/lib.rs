//! SQLite sink for normalized SRUM tables.
//!
//! Tables are created with idempotent statements, rows are inserted with
//! duplicate-tolerant semantics and each table is committed once.

mod error;
mod sqlite;

// === Error Types ===
pub use error::{OutputError, Result};

// === SQLite Sink ===
pub use sqlite::{
    DEFAULT_BUSY_TIMEOUT, InsertOutcome, OutputOptions, SqliteOutput, TableWriter, WriteStats,
    to_sql_value,
};
