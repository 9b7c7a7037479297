//! Subscriber types for the reactive system.
//!
//! A subscriber is anything a Dep can notify: plain effects and the effects
//! that power computeds. Deps store subscribers as `Weak<dyn Subscriber>`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::graph::Dep;

/// Unique identifier for an effect.
///
/// Deps deduplicate their members by this ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// What an effect is for. Dispatch runs every `Computed` member of a Dep
/// before any `Plain` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// A consumer-created effect.
    Plain,
    /// The internal effect of a computed value.
    Computed,
}

/// Alternate dispatch path for an effect.
pub type Scheduler = Arc<dyn Fn() + Send + Sync>;

/// The capability a Dep needs from its members.
pub(crate) trait Subscriber: Send + Sync {
    fn id(&self) -> EffectId;

    fn kind(&self) -> EffectKind;

    fn scheduler(&self) -> Option<Scheduler>;

    /// Whether a trigger raised during this effect's own run may re-dispatch it.
    fn allows_recurse(&self) -> bool;

    fn is_active(&self) -> bool;

    /// Re-run the effect, discarding its result.
    fn rerun(&self);

    /// Remember a Dep this effect was inserted into, for `stop`.
    fn record_dep(&self, dep: &Dep);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_ids_are_unique() {
        let id1 = EffectId::new();
        let id2 = EffectId::new();
        let id3 = EffectId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}
