//! Reading owners and access rules from the filesystem.
//!
//! On Unix the rules come from the POSIX access ACL when the node carries one
//! (`system.posix_acl_access`, Linux only), otherwise from the three mode-bit
//! classes. The "other" class is reported as [`EVERYONE`].

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use dirperm_core::{AccessRule, FileSystemRights, NodeKind, NodeSecurity};

use crate::owner::AccountCache;

/// Identity used for rules that apply to every account.
pub const EVERYONE: &str = "Everyone";

/// Source of a node's owner and access rules, and of directory listings.
pub trait AclReader: Send + Sync {
    /// Read the security descriptor of one node.
    fn read(&self, path: &Path, kind: NodeKind) -> io::Result<NodeSecurity>;

    /// List the children of `dir`. Defaults to [`list_directory`].
    fn list(&self, dir: &Path) -> io::Result<Vec<(PathBuf, NodeKind)>> {
        list_directory(dir)
    }
}

impl<R: AclReader + ?Sized> AclReader for Box<R> {
    fn read(&self, path: &Path, kind: NodeKind) -> io::Result<NodeSecurity> {
        (**self).read(path, kind)
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<(PathBuf, NodeKind)>> {
        (**self).list(dir)
    }
}

/// List the directories and regular files directly inside `dir`, sorted by
/// name. Symbolic links and special files are left out.
pub fn list_directory(dir: &Path) -> io::Result<Vec<(PathBuf, NodeKind)>> {
    let mut children = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;

        let kind = if file_type.is_dir() {
            NodeKind::Directory
        } else if file_type.is_file() {
            NodeKind::File
        } else {
            continue;
        };
        children.push((entry.path(), kind));
    }

    children.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));
    Ok(children)
}

/// Reader for POSIX mode bits and access ACLs.
#[derive(Debug, Default)]
pub struct PosixAclReader {
    #[cfg_attr(not(unix), allow(dead_code))]
    accounts: AccountCache,
}

impl PosixAclReader {
    /// Create a reader with an empty account cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AclReader for PosixAclReader {
    fn read(&self, path: &Path, _kind: NodeKind) -> io::Result<NodeSecurity> {
        let metadata = fs::metadata(path)?;
        self.describe(path, &metadata)
    }
}

#[cfg(unix)]
impl PosixAclReader {
    fn describe(&self, path: &Path, metadata: &Metadata) -> io::Result<NodeSecurity> {
        use std::os::unix::fs::MetadataExt;

        let (uid, gid, mode) = (metadata.uid(), metadata.gid(), metadata.mode());
        let owner = self.accounts.user_name(uid).unwrap_or_default();

        let rules = match read_access_acl(path)? {
            Some(entries) => self.rules_from_entries(&entries, uid, gid),
            None => vec![
                AccessRule::allow(
                    self.user_identity(uid),
                    FileSystemRights::from_mode_bits(mode >> 6),
                ),
                AccessRule::allow(
                    self.group_identity(gid),
                    FileSystemRights::from_mode_bits(mode >> 3),
                ),
                AccessRule::allow(EVERYONE, FileSystemRights::from_mode_bits(mode)),
            ],
        };

        Ok(NodeSecurity::new(owner, rules))
    }

    fn rules_from_entries(
        &self,
        entries: &[PosixAclEntry],
        uid: u32,
        gid: u32,
    ) -> Vec<AccessRule> {
        entries
            .iter()
            .filter_map(|entry| {
                let identity = match entry.tag {
                    AclTag::UserObj => self.user_identity(uid),
                    AclTag::User => self.user_identity(entry.id),
                    AclTag::GroupObj => self.group_identity(gid),
                    AclTag::Group => self.group_identity(entry.id),
                    AclTag::Other => EVERYONE.to_string(),
                    AclTag::Mask => return None,
                };
                let rights = FileSystemRights::from_mode_bits(u32::from(entry.perm));
                Some(AccessRule::allow(identity, rights))
            })
            .collect()
    }

    fn user_identity(&self, uid: u32) -> String {
        self.accounts.user_name(uid).unwrap_or_else(|| uid.to_string())
    }

    fn group_identity(&self, gid: u32) -> String {
        self.accounts.group_name(gid).unwrap_or_else(|| gid.to_string())
    }
}

#[cfg(not(unix))]
impl PosixAclReader {
    fn describe(&self, _path: &Path, metadata: &Metadata) -> io::Result<NodeSecurity> {
        let rights = if metadata.permissions().readonly() {
            FileSystemRights::READ | FileSystemRights::EXECUTE
        } else {
            FileSystemRights::FULL_CONTROL
        };
        Ok(NodeSecurity::new(String::new(), vec![AccessRule::allow(EVERYONE, rights)]))
    }
}

#[cfg(target_os = "linux")]
const ACCESS_ACL_XATTR: &str = "system.posix_acl_access";

/// Read the node's access ACL. `None` means the mode bits are authoritative.
#[cfg(target_os = "linux")]
fn read_access_acl(path: &Path) -> io::Result<Option<Vec<PosixAclEntry>>> {
    match xattr::get(path, ACCESS_ACL_XATTR) {
        Ok(Some(bytes)) => Ok(parse_posix_acl(&bytes)),
        Ok(None) => Ok(None),
        Err(error) if error.kind() == io::ErrorKind::PermissionDenied => Err(error),
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "access ACL unavailable");
            Ok(None)
        }
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn read_access_acl(_path: &Path) -> io::Result<Option<Vec<PosixAclEntry>>> {
    Ok(None)
}

const POSIX_ACL_VERSION: u32 = 2;
const POSIX_ACL_HEADER_LEN: usize = 4;
const POSIX_ACL_ENTRY_LEN: usize = 8;

/// Tag of a POSIX ACL entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclTag {
    UserObj,
    User,
    GroupObj,
    Group,
    Mask,
    Other,
}

impl AclTag {
    fn from_raw(tag: u16) -> Option<Self> {
        match tag {
            0x01 => Some(Self::UserObj),
            0x02 => Some(Self::User),
            0x04 => Some(Self::GroupObj),
            0x08 => Some(Self::Group),
            0x10 => Some(Self::Mask),
            0x20 => Some(Self::Other),
            _ => None,
        }
    }
}

/// One decoded POSIX ACL entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosixAclEntry {
    pub tag: AclTag,
    pub perm: u16,
    /// Qualifier uid/gid; meaningful for `User` and `Group` only.
    pub id: u32,
}

/// Decode the little-endian `system.posix_acl_*` attribute format.
///
/// Returns `None` for an unknown version or a truncated buffer. Entries with
/// unknown tags are skipped.
pub fn parse_posix_acl(bytes: &[u8]) -> Option<Vec<PosixAclEntry>> {
    let (header, body) = bytes.split_at_checked(POSIX_ACL_HEADER_LEN)?;
    let version = u32::from_le_bytes(header.try_into().ok()?);
    if version != POSIX_ACL_VERSION || body.len() % POSIX_ACL_ENTRY_LEN != 0 {
        return None;
    }

    let entries = body
        .chunks_exact(POSIX_ACL_ENTRY_LEN)
        .filter_map(|chunk| {
            let tag = AclTag::from_raw(u16::from_le_bytes([chunk[0], chunk[1]]))?;
            Some(PosixAclEntry {
                tag,
                perm: u16::from_le_bytes([chunk[2], chunk[3]]),
                id: u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
            })
        })
        .collect();
    Some(entries)
}
