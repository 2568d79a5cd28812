//! Depth-first permission collector.

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dirperm_core::{
    DepthPolicy, ExclusionSet, NodeKind, PermissionRecord, PermissionRecordSet, ScanError,
    ScanOptions, ScanWarning, normalize_path,
};

use crate::acl::{AclReader, PosixAclReader};
use crate::progress::{ProgressTracker, ScanProgress};

const ROOT_LEVEL: usize = 0;

/// Nodes between two progress broadcasts.
const PROGRESS_INTERVAL: u64 = 256;

/// Records and failures produced by one collection.
#[derive(Debug, Default)]
pub struct Collection {
    /// Records in first-seen order, de-duplicated by path.
    pub records: PermissionRecordSet,
    /// Recovered failures in the order they happened.
    pub warnings: Vec<ScanWarning>,
}

impl Collection {
    /// Largest path depth among the records.
    pub fn max_depth(&self) -> usize {
        self.records.max_depth()
    }
}

/// Walks root directories and reads the permissions of every visited node.
///
/// Roots and the depth policy are validated when the collector is built, so a
/// constructed collector always has something valid to walk.
pub struct EntryCollector<R = PosixAclReader> {
    roots: Vec<PathBuf>,
    exclude_paths: ExclusionSet,
    depth: DepthPolicy,
    include_files: bool,
    reader: R,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl EntryCollector {
    /// Create a collector that reads POSIX permissions.
    pub fn new(options: &ScanOptions) -> Result<Self, ScanError> {
        Self::with_reader(options, PosixAclReader::new())
    }
}

impl<R: AclReader> EntryCollector<R> {
    /// Create a collector with a custom permission source.
    pub fn with_reader(options: &ScanOptions, reader: R) -> Result<Self, ScanError> {
        let mut roots = Vec::with_capacity(options.roots.len());
        for root in &options.roots {
            let normalized = normalize_path(root)
                .map_err(|_| ScanError::RootNotFound { path: root.clone() })?;
            if !normalized.is_dir() {
                return Err(ScanError::RootNotFound { path: root.clone() });
            }
            roots.push(normalized);
        }

        if roots.is_empty() {
            return Err(ScanError::invalid_configuration(
                "At least one root path is required.",
            ));
        }

        let depth = options
            .depth
            .ok_or_else(|| ScanError::invalid_configuration("Search depth must be set."))?;

        let (progress_tx, _) = broadcast::channel(100);

        Ok(Self {
            roots,
            exclude_paths: ExclusionSet::from_paths(&options.exclude_paths),
            depth,
            include_files: options.include_files,
            reader,
            progress_tx,
        })
    }

    /// Subscribe to collection progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Normalized roots, in the order they will be walked.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk every root and collect one record per visited node.
    ///
    /// Returns [`ScanError::Cancelled`] as soon as cancellation is observed;
    /// partial results are dropped.
    pub fn collect(&self, cancel: &CancellationToken) -> Result<Collection, ScanError> {
        let mut walk = Walk {
            collection: Collection::default(),
            tracker: ProgressTracker::new(),
        };

        for root in &self.roots {
            check_cancelled(cancel)?;
            debug!(root = %root.display(), depth = %self.depth, "collecting permissions");
            self.visit_directory(root, ROOT_LEVEL, cancel, &mut walk)?;
        }

        let _ = self.progress_tx.send(walk.tracker.snapshot());
        debug!(
            records = walk.collection.records.len(),
            failures = walk.collection.warnings.len(),
            max_depth = walk.collection.max_depth(),
            "collection finished"
        );

        Ok(walk.collection)
    }

    fn visit_directory(
        &self,
        dir: &Path,
        level: usize,
        cancel: &CancellationToken,
        walk: &mut Walk,
    ) -> Result<(), ScanError> {
        if self.exclude_paths.contains_path(dir) {
            debug!(path = %dir.display(), "excluded");
            return Ok(());
        }

        walk.tracker.set_current_path(dir);
        let recorded = self.record_node(dir, NodeKind::Directory, walk)?;

        // Files are only reported for directories that could be read.
        let include_files = self.include_files && recorded;
        let descend = self.depth.allows_descent(level);
        if !descend && !include_files {
            return Ok(());
        }

        let children = match self.reader.list(dir) {
            Ok(children) => children,
            Err(error) => {
                let warning = ScanWarning::from_enumeration_error(ScanError::io(dir, error))?;
                self.recover(warning, walk);
                return Ok(());
            }
        };

        if include_files {
            for (path, _) in children.iter().filter(|(_, kind)| *kind == NodeKind::File) {
                check_cancelled(cancel)?;
                self.record_node(path, NodeKind::File, walk)?;
            }
        }

        if !descend {
            return Ok(());
        }

        for (path, _) in children
            .iter()
            .filter(|(_, kind)| *kind == NodeKind::Directory)
        {
            check_cancelled(cancel)?;
            self.visit_directory(path, level + 1, cancel, walk)?;
        }

        Ok(())
    }

    /// Read one node into the record set, logging recoverable failures.
    ///
    /// Returns whether a record was created.
    fn record_node(
        &self,
        path: &Path,
        kind: NodeKind,
        walk: &mut Walk,
    ) -> Result<bool, ScanError> {
        match self.reader.read(path, kind) {
            Ok(security) => {
                walk.collection
                    .records
                    .insert(PermissionRecord::new(path, kind, security));
                if walk.tracker.record_node() % PROGRESS_INTERVAL == 0 {
                    let _ = self.progress_tx.send(walk.tracker.snapshot());
                }
                Ok(true)
            }
            Err(error) => {
                let warning = ScanWarning::from_node_error(ScanError::io(path, error), kind)?;
                self.recover(warning, walk);
                Ok(false)
            }
        }
    }

    fn recover(&self, warning: ScanWarning, walk: &mut Walk) {
        warn!(path = %warning.path().display(), "{}", warning.message);
        walk.tracker.record_failure();
        walk.collection.warnings.push(warning);
    }
}

struct Walk {
    collection: Collection,
    tracker: ProgressTracker,
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), ScanError> {
    if cancel.is_cancelled() {
        Err(ScanError::Cancelled)
    } else {
        Ok(())
    }
}
