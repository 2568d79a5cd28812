//! Permission records and access rules.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Type of file system node a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
    /// Directory.
    Directory,
    /// Regular file.
    File,
}

/// Whether a rule grants or refuses its rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum AccessType {
    Allow,
    Deny,
}

/// Read/write/execute rights carried by an access rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSystemRights(u8);

impl FileSystemRights {
    pub const NONE: Self = Self(0);
    pub const EXECUTE: Self = Self(0o1);
    pub const WRITE: Self = Self(0o2);
    pub const READ: Self = Self(0o4);
    pub const FULL_CONTROL: Self = Self(0o7);

    /// Build rights from a Unix `rwx` triplet; higher bits are ignored.
    pub fn from_mode_bits(bits: u32) -> Self {
        Self((bits & 0o7) as u8)
    }

    /// Raw `rwx` bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Check whether every right in `other` is present.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for FileSystemRights {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for FileSystemRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let read = self.contains(Self::READ);
        let write = self.contains(Self::WRITE);
        let execute = self.contains(Self::EXECUTE);

        let names: &[&str] = match (read, write, execute) {
            (true, true, true) => &["FullControl"],
            (true, false, true) => &["ReadAndExecute"],
            (true, true, false) => &["Read", "Write"],
            (true, false, false) => &["Read"],
            (false, true, true) => &["Write", "ExecuteFile"],
            (false, true, false) => &["Write"],
            (false, false, true) => &["ExecuteFile"],
            (false, false, false) => &["None"],
        };
        f.write_str(&names.join(", "))
    }
}

/// One entry of a node's access-control list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    /// Account or group the rule applies to.
    pub identity: String,
    /// Rights granted or refused.
    pub rights: FileSystemRights,
    /// Allow or deny.
    pub access_type: AccessType,
    /// Whether the rule came from a parent container.
    pub is_inherited: bool,
}

impl AccessRule {
    /// Create an explicit allow rule.
    pub fn allow(identity: impl Into<String>, rights: FileSystemRights) -> Self {
        Self {
            identity: identity.into(),
            rights,
            access_type: AccessType::Allow,
            is_inherited: false,
        }
    }

    /// Create an explicit deny rule.
    pub fn deny(identity: impl Into<String>, rights: FileSystemRights) -> Self {
        Self {
            identity: identity.into(),
            rights,
            access_type: AccessType::Deny,
            is_inherited: false,
        }
    }

    /// Mark the rule as inherited.
    pub fn inherited(mut self) -> Self {
        self.is_inherited = true;
        self
    }
}

/// Owner and rules read from a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSecurity {
    /// Resolved owner account name, empty if it could not be resolved.
    pub owner: String,
    /// Access rules in list order.
    pub rules: Vec<AccessRule>,
}

impl NodeSecurity {
    /// Create a security descriptor.
    pub fn new(owner: impl Into<String>, rules: Vec<AccessRule>) -> Self {
        Self {
            owner: owner.into(),
            rules,
        }
    }
}

/// Permissions of one visited node.
///
/// Equality and hashing use the full path, compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRecord {
    full_path: String,
    path_segments: Vec<CompactString>,
    kind: NodeKind,
    access_rules: Vec<AccessRule>,
    owner: String,
}

impl PermissionRecord {
    /// Build a record for `path` from its security descriptor.
    pub fn new(path: &Path, kind: NodeKind, security: NodeSecurity) -> Self {
        let full_path = path.to_string_lossy().into_owned();
        let path_segments = split_segments(path, &full_path);

        Self {
            full_path,
            path_segments,
            kind,
            access_rules: security.rules,
            owner: security.owner,
        }
    }

    /// Full path as displayed in the report.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Path components, never empty.
    pub fn path_segments(&self) -> &[CompactString] {
        &self.path_segments
    }

    /// Number of path segments.
    pub fn depth(&self) -> usize {
        self.path_segments.len()
    }

    /// Directory or file.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Access rules in list order.
    pub fn access_rules(&self) -> &[AccessRule] {
        &self.access_rules
    }

    /// Owner account name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Lower-cased path used for identity comparisons.
    pub fn key(&self) -> String {
        self.full_path.to_lowercase()
    }
}

impl PartialEq for PermissionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PermissionRecord {}

impl Hash for PermissionRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

fn split_segments(path: &Path, full_path: &str) -> Vec<CompactString> {
    let segments: Vec<CompactString> = path
        .components()
        .filter_map(|component| match component {
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy()),
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .filter(|segment| !segment.trim().is_empty())
        .map(CompactString::from)
        .collect();

    if segments.is_empty() {
        vec![CompactString::from(full_path)]
    } else {
        segments
    }
}
