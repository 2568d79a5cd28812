//! Scan orchestration for dirperm.
//!
//! [`ScanCoordinator`] runs collection and formatting on a background worker
//! and reports the outcome; [`ReportWriter`] persists a completed result.

mod coordinator;
mod output;

pub use coordinator::{ScanCoordinator, ScanOutcome, ScanState};
pub use output::{OutputError, ReportWriter, WrittenReport};

// Re-export the types callers need to drive a scan
pub use dirperm_core::{DepthPolicy, PathMode, ScanError, ScanOptions, ScanResult};
pub use dirperm_scan::ScanProgress;
