//! Permission collection engine for dirperm.
//!
//! This crate walks root directories depth-first and reads the owner and
//! access-control entries of every visited node.
//!
//! # Overview
//!
//! - **Bounded traversal** controlled by a [`DepthPolicy`]
//! - **Exact-path exclusion** of directories and their subtrees
//! - **Partial failure** handling: access denied and over-long paths are
//!   logged and the walk carries on
//! - **Cooperative cancellation** through a `CancellationToken`
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use dirperm_scan::{EntryCollector, ScanOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let options = ScanOptions::new("/srv/share");
//! let collector = EntryCollector::new(&options).unwrap();
//! let collection = collector.collect(&CancellationToken::new()).unwrap();
//!
//! println!("Records: {}", collection.records.len());
//! println!("Failures: {}", collection.warnings.len());
//! ```

mod acl;
mod collector;
mod owner;
mod progress;

pub use acl::{
    AclReader, AclTag, EVERYONE, PosixAclEntry, PosixAclReader, list_directory, parse_posix_acl,
};
pub use collector::{Collection, EntryCollector};
pub use owner::AccountCache;
pub use progress::ScanProgress;

// Re-export core types for convenience
pub use dirperm_core::{
    AccessRule, DepthPolicy, NodeKind, NodeSecurity, PermissionRecord, PermissionRecordSet,
    ScanError, ScanOptions, ScanWarning, WarningKind,
};
