//! Target Map
//!
//! The process-wide table from observed target to per-key Deps.
//!
//! Targets are identified by [`TargetId`], never by a handle, so the table
//! does not keep any object alive. Objects call [`forget_target`] when their
//! last handle is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use dashmap::DashMap;

use super::Dep;
use crate::value::Key;

/// Unique identity of an observed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Generate a new unique target ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

type KeyToDepMap = HashMap<Key, Dep>;

static TARGET_MAP: OnceLock<DashMap<TargetId, KeyToDepMap>> = OnceLock::new();

fn target_map() -> &'static DashMap<TargetId, KeyToDepMap> {
    TARGET_MAP.get_or_init(DashMap::new)
}

/// Get the Dep for `(target, key)`, creating an empty one on first access.
pub fn get_or_create_dep(target: TargetId, key: &Key) -> Dep {
    let mut deps = target_map().entry(target).or_default();
    deps.entry(key.clone()).or_default().clone()
}

/// Get the Dep for `(target, key)` if the slot has ever been tracked.
pub fn get_dep(target: TargetId, key: &Key) -> Option<Dep> {
    target_map()
        .get(&target)
        .and_then(|deps| deps.get(key).cloned())
}

/// Check whether a Dep exists for `(target, key)`.
pub fn has_dep(target: TargetId, key: &Key) -> bool {
    target_map()
        .get(&target)
        .is_some_and(|deps| deps.contains_key(key))
}

/// Check whether any key of `target` has been tracked.
pub fn is_tracked(target: TargetId) -> bool {
    target_map().contains_key(&target)
}

/// Number of tracked keys of `target`.
pub fn tracked_key_count(target: TargetId) -> usize {
    target_map().get(&target).map_or(0, |deps| deps.len())
}

/// Drop every Dep recorded for `target`.
pub(crate) fn forget_target(target: TargetId) {
    if let Some((_, deps)) = target_map().remove(&target) {
        tracing::trace!(target = target.raw(), keys = deps.len(), "forgot target");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ids_are_unique() {
        let id1 = TargetId::new();
        let id2 = TargetId::new();
        assert_ne!(id1, id2);
        assert!(id2.raw() > id1.raw());
    }

    #[test]
    fn dep_is_created_lazily() {
        let target = TargetId::new();
        let key = Key::from("count");

        assert!(!has_dep(target, &key));
        assert!(get_dep(target, &key).is_none());
        assert!(!is_tracked(target));

        let dep = get_or_create_dep(target, &key);
        assert!(dep.is_empty());
        assert!(has_dep(target, &key));
        assert!(is_tracked(target));
    }

    #[test]
    fn same_slot_returns_same_dep() {
        let target = TargetId::new();
        let key = Key::from("name");

        let first = get_or_create_dep(target, &key);
        let second = get_or_create_dep(target, &key);
        assert!(first.ptr_eq(&second));
        assert!(get_dep(target, &key).is_some_and(|dep| dep.ptr_eq(&first)));
    }

    #[test]
    fn keys_are_independent() {
        let target = TargetId::new();

        let a = get_or_create_dep(target, &Key::from("a"));
        let zero = get_or_create_dep(target, &Key::from(0usize));
        assert!(!a.ptr_eq(&zero));
        assert_eq!(tracked_key_count(target), 2);
        assert!(!has_dep(target, &Key::from("b")));
    }

    #[test]
    fn forget_target_removes_all_keys() {
        let target = TargetId::new();
        get_or_create_dep(target, &Key::from("a"));
        get_or_create_dep(target, &Key::from("b"));

        forget_target(target);
        assert!(!is_tracked(target));
        assert_eq!(tracked_key_count(target), 0);
    }
}
