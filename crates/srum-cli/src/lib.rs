//! CLI library components for the SRUM converter.

pub mod logging;
pub mod pipeline;
pub mod types;
