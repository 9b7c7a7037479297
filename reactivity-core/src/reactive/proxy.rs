//! Reactive Proxies
//!
//! A [`Reactive`] wraps a raw [`Object`] and intercepts reads and writes:
//!
//! - `get` reads the slot, then [`track`]s `(object, key)`.
//! - `set` writes the slot, then [`trigger`]s `(object, key)`.
//!
//! New and existing keys are treated alike, as are index and named keys.
//! Every successful write triggers, even when the value is unchanged.
//!
//! # Nested values
//!
//! Reading a slot that holds a raw object returns it wrapped in a proxy, so
//! nested reads are tracked too. Reading a slot that holds a [`Ref`] returns
//! the ref's value, except for index keys of arrays.

use std::fmt;

use super::runtime::{track, trigger};
use crate::error::Result;
use crate::graph::TargetId;
use crate::value::{to_raw, Key, Object, Value};

#[cfg(doc)]
use super::Ref;

/// A tracked view of an [`Object`].
///
/// Cloning a `Reactive` yields another handle to the same proxy. Two proxies
/// over the same object are the same proxy.
#[derive(Clone)]
pub struct Reactive {
    target: Object,
}

/// Wrap `target` in a reactive proxy.
///
/// Passing an existing proxy returns one with the same identity.
pub fn reactive(target: impl Into<Object>) -> Reactive {
    Reactive::new(target.into())
}

/// Check whether `value` is a reactive proxy.
pub fn is_reactive(value: &Value) -> bool {
    value.is_reactive()
}

impl Reactive {
    pub fn new(target: Object) -> Self {
        Self { target }
    }

    /// Identity of the underlying object in the dependency graph.
    pub fn id(&self) -> TargetId {
        self.target.id()
    }

    /// The underlying object. Reads and writes through it are not tracked.
    pub fn raw(&self) -> &Object {
        &self.target
    }

    /// Read `key`, subscribing the active effect to it.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = key.into();
        let value = self.target.get_raw(&key);
        track(self.target.id(), &key);

        match value {
            Value::Ref(r) if !(self.target.is_array() && key.is_index()) => r.get(),
            Value::Object(object) => Value::Reactive(Reactive::new(object)),
            other => other,
        }
    }

    /// Check whether `key` exists, subscribing the active effect to it.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        track(self.target.id(), &key);
        self.target.has(&key)
    }

    /// Write `key` and notify its dependents.
    ///
    /// Proxies are stored as their raw object. Writing a non-ref value over
    /// a slot holding a [`Ref`] updates that ref instead of the slot.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = to_raw(value.into());

        if !(self.target.is_array() && key.is_index()) && !value.is_ref() {
            if let Value::Ref(existing) = self.target.get_raw(&key) {
                existing.set(value);
                return Ok(());
            }
        }

        self.target.set_raw(key.clone(), value.clone())?;
        trigger(self.target.id(), &key, Some(&value));
        Ok(())
    }

    /// Check whether two handles are the same proxy.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        self.target.ptr_eq(&other.target)
    }
}

impl From<Reactive> for Object {
    fn from(proxy: Reactive) -> Self {
        proxy.target
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.target).finish()
    }
}
