//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Hard cap on emitted report rows.
pub const DEFAULT_MAX_ROWS: usize = 1_048_574;

/// How far below each root the collector descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DepthPolicy {
    /// Every directory in the tree.
    All,
    /// The root and its immediate subdirectories.
    Children,
    /// The root only.
    Current,
}

impl DepthPolicy {
    /// Whether the walk may descend from a directory at `level`.
    pub fn allows_descent(self, level: usize) -> bool {
        match self {
            DepthPolicy::All => true,
            DepthPolicy::Children => level == 0,
            DepthPolicy::Current => false,
        }
    }
}

/// How paths are rendered in the report.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// One `Level N` column per path segment.
    #[default]
    Split,
    /// A single `Path` column holding the full path.
    Combined,
}

/// Configuration for one permission scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanOptions {
    /// Root directories to walk.
    pub roots: Vec<PathBuf>,

    /// Directories skipped together with their subtree.
    #[builder(default)]
    #[serde(default)]
    pub exclude_paths: Vec<PathBuf>,

    /// Identity names whose rules are left out of the report.
    #[builder(default)]
    #[serde(default)]
    pub exclude_identities: Vec<String>,

    /// Depth policy. `None` is the unset state and is rejected by the collector.
    #[builder(default = "Some(DepthPolicy::All)")]
    #[serde(default)]
    pub depth: Option<DepthPolicy>,

    /// Record files found directly inside visited directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_files: bool,

    /// Path column layout.
    #[builder(default)]
    #[serde(default)]
    pub path_mode: PathMode,

    /// Emit the leading `#` column.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_row_numbers: bool,

    /// Maximum number of data rows.
    #[builder(default = "DEFAULT_MAX_ROWS")]
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

impl ScanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.roots {
            Some(ref roots) if !roots.is_empty() => Ok(()),
            _ => Err("At least one root path is required".to_string()),
        }
    }
}

impl ScanOptions {
    /// Create a new options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Create options that scan a single root with every default.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
            exclude_paths: Vec::new(),
            exclude_identities: Vec::new(),
            depth: Some(DepthPolicy::All),
            include_files: false,
            path_mode: PathMode::Split,
            include_row_numbers: true,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Drop blank entries from every list.
    pub fn sanitized(mut self) -> Self {
        self.roots.retain(|p| !is_blank(&p.to_string_lossy()));
        self.exclude_paths
            .retain(|p| !is_blank(&p.to_string_lossy()));
        self.exclude_identities.retain(|name| !is_blank(name));
        self
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
