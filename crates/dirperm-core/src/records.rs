//! Collected record set and final scan result.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::node::PermissionRecord;

/// Insertion-ordered set of records keyed by case-insensitive path.
#[derive(Debug, Clone, Default)]
pub struct PermissionRecordSet {
    records: IndexMap<String, PermissionRecord>,
    max_depth: usize,
}

impl PermissionRecordSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Returns `false` if a record with the same path was
    /// already present; the first one is kept.
    pub fn insert(&mut self, record: PermissionRecord) -> bool {
        self.max_depth = self.max_depth.max(record.depth());
        match self.records.entry(record.key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Largest `depth` of any record.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Look up a record by path, ignoring case.
    pub fn get(&self, path: &str) -> Option<&PermissionRecord> {
        self.records.get(&path.to_lowercase())
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionRecord> {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a PermissionRecordSet {
    type Item = &'a PermissionRecord;
    type IntoIter = indexmap::map::Values<'a, String, PermissionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

impl FromIterator<PermissionRecord> for PermissionRecordSet {
    fn from_iter<T: IntoIterator<Item = PermissionRecord>>(iter: T) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Output of a completed scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Rendered report text.
    pub report: String,
    /// Recovered failures in the order they happened.
    pub log: Vec<ScanWarning>,
}

impl ScanResult {
    /// Create a scan result.
    pub fn new(report: String, log: Vec<ScanWarning>) -> Self {
        Self { report, log }
    }

    /// Failure messages, one per entry.
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(|warning| warning.message.as_str())
    }

    /// Check if any failures were recorded.
    pub fn has_failures(&self) -> bool {
        !self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::node::{NodeKind, NodeSecurity};

    fn record(path: &str, owner: &str) -> PermissionRecord {
        PermissionRecord::new(
            Path::new(path),
            NodeKind::Directory,
            NodeSecurity::new(owner, Vec::new()),
        )
    }

    #[test]
    fn test_first_seen_wins() {
        let mut set = PermissionRecordSet::new();
        assert!(set.insert(record("/data/Sub", "first")));
        assert!(!set.insert(record("/DATA/sub", "second")));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("/data/sub").unwrap().owner(), "first");
    }

    #[test]
    fn test_insertion_order_and_max_depth() {
        let set: PermissionRecordSet = [
            record("/b", ""),
            record("/a/b/c", ""),
            record("/a", ""),
        ]
        .into_iter()
        .collect();

        let paths: Vec<_> = set.iter().map(|r| r.full_path()).collect();
        assert_eq!(paths, vec!["/b", "/a/b/c", "/a"]);
        assert_eq!(set.max_depth(), 3);
    }
}
