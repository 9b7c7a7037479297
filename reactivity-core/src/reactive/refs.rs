//! Ref Implementation
//!
//! A Ref is a single reactive slot. It owns a private Dep instead of an
//! entry in the global graph.
//!
//! # How Refs Work
//!
//! 1. Reading inside an effect subscribes the effect to the ref's Dep,
//!    creating the Dep on first use.
//!
//! 2. Writing compares the new value against the stored raw value with
//!    SameValue semantics. Only an actual change updates the ref and
//!    dispatches its Dep.
//!
//! # Deep and Shallow
//!
//! A deep ref (the default, [`ref_`]) exposes raw objects wrapped in a
//! reactive proxy and compares writes by their raw object. A shallow ref
//! ([`shallow_ref`]) stores and exposes exactly what it is given.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::runtime::{track_effects, trigger_effects};
use super::ReactiveContext;
use crate::graph::Dep;
use crate::value::{has_changed, to_raw, to_reactive, Value};

struct RefInner {
    raw: RwLock<Value>,
    value: RwLock<Value>,
    dep: Mutex<Option<Dep>>,
    shallow: bool,
}

/// A reactive single-value box.
///
/// Cloning a `Ref` creates a new handle to the same slot.
#[derive(Clone)]
pub struct Ref {
    inner: Arc<RefInner>,
}

/// Create a deep ref. Passing a value that already is a ref returns it.
pub fn ref_(value: impl Into<Value>) -> Ref {
    create_ref(value.into(), false)
}

/// Create a shallow ref. Passing a value that already is a ref returns it.
pub fn shallow_ref(value: impl Into<Value>) -> Ref {
    create_ref(value.into(), true)
}

fn create_ref(value: Value, shallow: bool) -> Ref {
    match value {
        Value::Ref(existing) => existing,
        value => Ref::with_value(value, shallow),
    }
}

pub fn is_ref(value: &Value) -> bool {
    value.is_ref()
}

/// The value of a ref, or `value` itself if it is not one.
pub fn unref(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.get(),
        other => other.clone(),
    }
}

/// Dispatch a ref's dependents without changing it.
pub fn trigger_ref(r: &Ref) {
    trigger_ref_value(&r.inner.dep);
}

impl Ref {
    fn with_value(value: Value, shallow: bool) -> Self {
        let (raw, exposed) = if shallow {
            (value.clone(), value)
        } else {
            let raw = to_raw(value);
            (raw.clone(), to_reactive(raw))
        };
        Self {
            inner: Arc::new(RefInner {
                raw: RwLock::new(raw),
                value: RwLock::new(exposed),
                dep: Mutex::new(None),
                shallow,
            }),
        }
    }

    /// Read the value, subscribing the active effect.
    pub fn get(&self) -> Value {
        track_ref_value(&self.inner.dep);
        self.inner.value.read().clone()
    }

    pub fn get_untracked(&self) -> Value {
        self.inner.value.read().clone()
    }

    /// Write the value, dispatching dependents if it changed.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        let new_raw = if self.inner.shallow { value } else { to_raw(value) };

        {
            let mut raw = self.inner.raw.write();
            if !has_changed(&new_raw, &raw) {
                return;
            }
            *raw = new_raw.clone();
        }
        *self.inner.value.write() = if self.inner.shallow {
            new_raw
        } else {
            to_reactive(new_raw)
        };

        trigger_ref_value(&self.inner.dep);
    }

    /// Write a value computed from the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.get_untracked());
        self.set(next);
    }

    pub fn is_shallow(&self) -> bool {
        self.inner.shallow
    }

    /// Number of effects subscribed to this ref.
    pub fn dependent_count(&self) -> usize {
        self.inner.dep.lock().as_ref().map_or(0, Dep::len)
    }

    /// Check whether two handles refer to the same ref.
    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.get_untracked())
            .field("shallow", &self.inner.shallow)
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

/// Subscribe the active effect to an owned, lazily created Dep.
pub(crate) fn track_ref_value(slot: &Mutex<Option<Dep>>) {
    if !ReactiveContext::is_active() {
        return;
    }
    let dep = slot.lock().get_or_insert_with(Dep::new).clone();
    track_effects(&dep);
}

/// Dispatch an owned Dep, if it was ever created.
pub(crate) fn trigger_ref_value(slot: &Mutex<Option<Dep>>) {
    let dep = slot.lock().clone();
    if let Some(dep) = dep {
        trigger_effects(&dep);
    }
}
