//! CSV rendering of collected permission records.
//!
//! The report has one header line and one row per (node, access rule) pair.
//! Paths are rendered either as one `Level N` column per path segment or as a
//! single `Path` column.

mod config;
mod csv;
mod formatter;

pub use config::{FormatConfig, FormatConfigBuilder};
pub use csv::LINE_ENDING;
pub use formatter::ReportFormatter;
