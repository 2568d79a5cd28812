//! Error types for permission scans.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::NodeKind;

/// Errors that can occur during a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A supplied root does not exist or is not a directory.
    #[error("Could not find directory '{}'", path.display())]
    RootNotFound { path: PathBuf },

    /// Options are incomplete or inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Permission denied reading a node or enumerating its children.
    #[error("Access to the path '{}' is denied.", path.display())]
    NodeAccessDenied { path: PathBuf },

    /// A node's path exceeds platform limits.
    #[error("The path '{}' is too long.", path.display())]
    PathTooLong { path: PathBuf },

    /// Cooperative cancellation was observed.
    #[error("The operation was canceled.")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context, classifying recoverable kinds.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::NodeAccessDenied { path }
        } else if is_path_too_long(&source) {
            Self::PathTooLong { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Create a configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Whether traversal may log this error and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NodeAccessDenied { .. } | Self::PathTooLong { .. })
    }

    /// Whether this is the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const NAME_TOO_LONG_CODES: &[i32] = &[36];

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
const NAME_TOO_LONG_CODES: &[i32] = &[63];

// ERROR_FILENAME_EXCED_RANGE, ERROR_BUFFER_OVERFLOW
#[cfg(windows)]
const NAME_TOO_LONG_CODES: &[i32] = &[206, 111];

#[cfg(not(any(unix, windows)))]
const NAME_TOO_LONG_CODES: &[i32] = &[];

/// Check whether an I/O error means the path exceeded platform limits.
pub fn is_path_too_long(error: &io::Error) -> bool {
    error
        .raw_os_error()
        .is_some_and(|code| NAME_TOO_LONG_CODES.contains(&code))
}

/// Kind of recovered failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied reading the node's security descriptor.
    AccessDenied,
    /// The node's path was too long.
    PathTooLong,
    /// Permission was denied listing a directory.
    EnumerationDenied,
}

/// Non-fatal failure recorded in the scan log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the failure occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of failure.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create an access denied warning for a node.
    pub fn access_denied(path: impl Into<PathBuf>, kind: NodeKind) -> Self {
        let path = path.into();
        let message = format!("Could not get permissions for {kind} '{}'", path.display());
        Self::new(path, message, WarningKind::AccessDenied)
    }

    /// Create a path too long warning for a node.
    pub fn path_too_long(path: impl Into<PathBuf>, kind: NodeKind) -> Self {
        let path = path.into();
        let message = format!("The path of {kind} with name '{}' is too long.", path.display());
        Self::new(path, message, WarningKind::PathTooLong)
    }

    /// Create a warning for a directory whose children could not be listed.
    pub fn enumeration_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let message = format!("Access to the path '{}' is denied.", path.display());
        Self::new(path, message, WarningKind::EnumerationDenied)
    }

    /// Convert a recoverable error for a node into a warning.
    ///
    /// Returns the error back when it is not recoverable.
    pub fn from_node_error(error: ScanError, kind: NodeKind) -> Result<Self, ScanError> {
        match error {
            ScanError::NodeAccessDenied { path } => Ok(Self::access_denied(path, kind)),
            ScanError::PathTooLong { path } => Ok(Self::path_too_long(path, kind)),
            other => Err(other),
        }
    }

    /// Convert a recoverable error from listing a directory into a warning.
    pub fn from_enumeration_error(error: ScanError) -> Result<Self, ScanError> {
        match error {
            ScanError::NodeAccessDenied { path } => Ok(Self::enumeration_denied(path)),
            ScanError::PathTooLong { path } => {
                Ok(Self::path_too_long(path, NodeKind::Directory))
            }
            other => Err(other),
        }
    }

    /// Path of the failing node.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
