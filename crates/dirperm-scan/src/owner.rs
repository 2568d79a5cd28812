//! Account name resolution with a per-scan cache.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Caches uid/gid to name lookups so each id hits the account database once.
#[derive(Debug, Default)]
pub struct AccountCache {
    users: Mutex<HashMap<u32, Option<String>>>,
    groups: Mutex<HashMap<u32, Option<String>>>,
}

impl AccountCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the user with `uid`, if it maps to an account.
    pub fn user_name(&self, uid: u32) -> Option<String> {
        lookup(&self.users, uid, resolve_user)
    }

    /// Name of the group with `gid`, if it maps to a group.
    pub fn group_name(&self, gid: u32) -> Option<String> {
        lookup(&self.groups, gid, resolve_group)
    }
}

fn lookup(
    cache: &Mutex<HashMap<u32, Option<String>>>,
    id: u32,
    resolve: fn(u32) -> Option<String>,
) -> Option<String> {
    let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
    cache.entry(id).or_insert_with(|| resolve(id)).clone()
}

#[cfg(unix)]
fn resolve_user(uid: u32) -> Option<String> {
    uzers::get_user_by_uid(uid).map(|user| user.name().to_string_lossy().into_owned())
}

#[cfg(unix)]
fn resolve_group(gid: u32) -> Option<String> {
    uzers::get_group_by_gid(gid).map(|group| group.name().to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn resolve_user(_uid: u32) -> Option<String> {
    None
}

#[cfg(not(unix))]
fn resolve_group(_gid: u32) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_cache_matches_direct_lookup() {
        let cache = AccountCache::new();
        let uid = uzers::get_current_uid();

        let first = cache.user_name(uid);
        assert_eq!(first, resolve_user(uid));
        assert_eq!(cache.user_name(uid), first);
    }

    #[test]
    fn test_unmapped_id_is_none() {
        let cache = AccountCache::new();
        assert_eq!(cache.group_name(u32::MAX - 7), None);
    }
}
