//! Case-insensitive exclusion sets for paths and identities.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Make `path` absolute without resolving symlinks, dropping `.` parts and
/// trailing separators.
pub fn normalize_path(path: &Path) -> io::Result<PathBuf> {
    Ok(std::path::absolute(path)?.components().collect())
}

/// Set of names matched exactly, ignoring case.
///
/// An empty set never excludes anything.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    entries: HashSet<String>,
}

impl ExclusionSet {
    /// Build a set from identity names. Blank names are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = names
            .into_iter()
            .filter(|name| !name.as_ref().trim().is_empty())
            .map(|name| name.as_ref().to_lowercase())
            .collect();
        Self { entries }
    }

    /// Build a set from paths, normalizing each one first.
    ///
    /// Paths that cannot be made absolute are kept as written.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let entries = paths
            .into_iter()
            .filter(|path| !path.as_ref().to_string_lossy().trim().is_empty())
            .map(|path| {
                let path = path.as_ref();
                normalize_path(path)
                    .unwrap_or_else(|_| path.to_path_buf())
                    .to_string_lossy()
                    .to_lowercase()
            })
            .collect();
        Self { entries }
    }

    /// Check whether `name` is in the set.
    pub fn contains(&self, name: &str) -> bool {
        !self.entries.is_empty() && self.entries.contains(&name.to_lowercase())
    }

    /// Check whether `path` is in the set.
    pub fn contains_path(&self, path: &Path) -> bool {
        self.contains(&path.to_string_lossy())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
