//! Collection progress reporting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Progress information during a collection.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of records created so far.
    pub nodes_scanned: u64,
    /// Number of failures logged so far.
    pub failures: u64,
    /// Directory currently being visited.
    pub current_path: PathBuf,
    /// Time elapsed since collection started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            nodes_scanned: 0,
            failures: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in nodes per second.
    pub fn nodes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.nodes_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal progress tracker with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    nodes_scanned: u64,
    failures: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            nodes_scanned: 0,
            failures: 0,
            current_path: PathBuf::new(),
        }
    }

    pub fn record_node(&mut self) -> u64 {
        self.nodes_scanned += 1;
        self.nodes_scanned
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn set_current_path(&mut self, path: &Path) {
        path.clone_into(&mut self.current_path);
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            nodes_scanned: self.nodes_scanned,
            failures: self.failures,
            current_path: self.current_path.clone(),
            elapsed: self.start_time.elapsed(),
        }
    }
}
