//! Reactive Runtime
//!
//! The runtime connects reads and writes to the dependency graph.
//!
//! # How It Works
//!
//! 1. A tracked read calls [`track`], which records the active effect in the
//!    Dep for `(target, key)`. Refs and computeds own their Dep and call
//!    [`track_effects`] on it directly.
//!
//! 2. A write calls [`trigger`] (or [`trigger_effects`] for an owned Dep),
//!    which dispatches every member of a snapshot of the Dep:
//!    a. all computed effects first, in insertion order
//!    b. then all plain effects, in insertion order
//!
//! 3. Dispatching an effect runs its scheduler if it has one, or re-runs it.
//!
//! Running computed effects first means every computed is marked dirty
//! before any plain effect that reads it re-runs.

use tracing::trace;

use super::context::ReactiveContext;
use super::subscriber::{EffectKind, Subscriber};
use crate::graph::{self, Dep, TargetId};
use crate::value::{Key, Value};

/// Record that the active effect reads `(target, key)`.
///
/// Does nothing, and creates no Dep, when no effect is active.
pub fn track(target: TargetId, key: &Key) {
    if !ReactiveContext::is_active() {
        return;
    }
    trace!(target = target.raw(), %key, "track");
    let dep = graph::get_or_create_dep(target, key);
    track_effects(&dep);
}

/// Insert the active effect into `dep`.
pub fn track_effects(dep: &Dep) {
    let Some(active) = ReactiveContext::current() else {
        return;
    };
    if dep.insert(active.id, active.handle.clone()) {
        if let Some(effect) = active.handle.upgrade() {
            effect.record_dep(dep);
        }
    }
}

/// Notify every effect that reads `(target, key)`.
///
/// Does nothing if the slot was never tracked.
pub fn trigger(target: TargetId, key: &Key, new_value: Option<&Value>) {
    let Some(dep) = graph::get_dep(target, key) else {
        return;
    };
    trace!(target = target.raw(), %key, new_value = ?new_value, "trigger");
    trigger_effects(&dep);
}

/// Dispatch a snapshot of `dep`: computed effects first, then plain ones.
pub fn trigger_effects(dep: &Dep) {
    let effects = dep.snapshot();
    if effects.is_empty() {
        return;
    }

    for effect in effects.iter().filter(|e| e.kind() == EffectKind::Computed) {
        trigger_effect(effect.as_ref());
    }
    for effect in effects.iter().filter(|e| e.kind() == EffectKind::Plain) {
        trigger_effect(effect.as_ref());
    }
}

fn trigger_effect(effect: &dyn Subscriber) {
    if !effect.is_active() {
        return;
    }
    if ReactiveContext::running_effect_id() == Some(effect.id()) && !effect.allows_recurse() {
        trace!(effect = effect.id().raw(), "skipping trigger of running effect");
        return;
    }
    match effect.scheduler() {
        Some(scheduler) => scheduler(),
        None => effect.rerun(),
    }
}
