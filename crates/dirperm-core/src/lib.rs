//! Core types and traits for dirperm.
//!
//! This crate provides the data model shared by the collector, the report
//! formatter and the coordinator: permission records, scan options, exclusion
//! sets and the error taxonomy.

mod config;
mod error;
mod filter;
mod node;
mod records;

pub use config::{DEFAULT_MAX_ROWS, DepthPolicy, PathMode, ScanOptions, ScanOptionsBuilder};
pub use error::{ScanError, ScanWarning, WarningKind, is_path_too_long};
pub use filter::{ExclusionSet, normalize_path};
pub use node::{
    AccessRule, AccessType, FileSystemRights, NodeKind, NodeSecurity, PermissionRecord,
};
pub use records::{PermissionRecordSet, ScanResult};
