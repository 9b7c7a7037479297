//! Dependency Sets
//!
//! A [`Dep`] is the set of effects depending on one observable slot. It is a
//! cheap, cloneable handle: the per-key table of the graph, refs and
//! computeds all share Deps by handle.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::reactive::subscriber::{EffectId, Subscriber};

/// Effects collected from a Dep for one dispatch.
pub(crate) type Snapshot = SmallVec<[Arc<dyn Subscriber>; 8]>;

type Subscribers = Mutex<IndexMap<EffectId, Weak<dyn Subscriber>>>;

/// The set of effects currently depending on one slot.
///
/// Members are unique by [`EffectId`] and iterate in insertion order.
#[derive(Clone, Default)]
pub struct Dep {
    subscribers: Arc<Subscribers>,
}

/// A non-owning handle to a [`Dep`].
///
/// Effects remember the Deps they joined through these, so a Dep lives only
/// as long as its slot does.
#[derive(Clone)]
pub(crate) struct WeakDep {
    subscribers: Weak<Subscribers>,
}

impl WeakDep {
    pub(crate) fn upgrade(&self) -> Option<Dep> {
        self.subscribers.upgrade().map(|subscribers| Dep { subscribers })
    }

    /// Whether the Dep has been dropped.
    pub(crate) fn is_dead(&self) -> bool {
        self.subscribers.strong_count() == 0
    }
}

impl Dep {
    /// Create an empty Dep.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an effect. Returns `false` if it was already a member.
    pub(crate) fn insert(&self, id: EffectId, effect: Weak<dyn Subscriber>) -> bool {
        let mut subscribers = self.subscribers.lock();
        if subscribers.contains_key(&id) {
            return false;
        }
        subscribers.insert(id, effect);
        true
    }

    /// Remove an effect, keeping the order of the remaining members.
    pub(crate) fn remove(&self, id: EffectId) -> bool {
        self.subscribers.lock().shift_remove(&id).is_some()
    }

    /// Collect the live members in insertion order, pruning dropped ones.
    ///
    /// The lock is released before the snapshot is returned, so effects run
    /// from it may freely track into or trigger this Dep.
    pub(crate) fn snapshot(&self) -> Snapshot {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, effect| effect.strong_count() > 0);
        subscribers.values().filter_map(Weak::upgrade).collect()
    }

    /// Check whether the effect with the given id is a member.
    pub fn contains(&self, id: EffectId) -> bool {
        self.subscribers.lock().contains_key(&id)
    }

    /// Number of recorded members, including ones not yet pruned.
    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Check whether the Dep has no recorded members.
    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    pub(crate) fn downgrade(&self) -> WeakDep {
        WeakDep {
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Check whether two handles refer to the same Dep.
    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Arc::ptr_eq(&self.subscribers, &other.subscribers)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep").field("len", &self.len()).finish()
    }
}
