//! Value Model
//!
//! Reactive objects hold dynamically typed [`Value`]s under property
//! [`Key`]s. An [`Object`] is the raw, untracked container; wrapping it with
//! [`reactive`](crate::reactive::reactive) yields a proxy whose reads and
//! writes are tracked.
//!
//! # Identity
//!
//! Objects, proxies and refs compare by identity, never structurally. Two
//! handles are "the same value" only if they share the same allocation.
//! Numbers follow SameValue semantics: `NaN` is the same as `NaN`, while
//! `0.0` and `-0.0` differ.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{ReactiveError, Result};
use crate::graph::{self, TargetId};
use crate::reactive::{Reactive, Ref};

/// A property key: a named field or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(Arc<str>),
    Index(usize),
}

impl Key {
    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(Arc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(Arc::from(name))
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A dynamically typed value stored in objects and refs.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    /// A raw object. Reads through it are not tracked.
    Object(Object),
    /// A reactive proxy over an object.
    Reactive(Reactive),
    Ref(Ref),
}

impl Value {
    /// Name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(object) if object.is_array() => "array",
            Value::Object(_) => "object",
            Value::Reactive(proxy) if proxy.raw().is_array() => "reactive array",
            Value::Reactive(_) => "reactive object",
            Value::Ref(_) => "ref",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// True for raw objects and reactive proxies, arrays included.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Reactive(_))
    }

    pub fn is_array(&self) -> bool {
        match self {
            Value::Object(object) => object.is_array(),
            Value::Reactive(proxy) => proxy.raw().is_array(),
            _ => false,
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, Value::Reactive(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn as_ref_handle(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Snapshot as JSON, reading refs without tracking.
    ///
    /// `Undefined` and non-finite numbers become `null`. Self-referencing
    /// objects recurse without bound.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Object(object) => object.to_json(),
            Value::Reactive(proxy) => proxy.raw().to_json(),
            Value::Ref(r) => r.get_untracked().to_json(),
        }
    }
}

/// SameValue equality: see the module documentation.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        same_value(self, other)
    }
}

/// SameValue comparison used for change detection.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() || y.is_nan() {
                x.is_nan() && y.is_nan()
            } else {
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        (Value::Reactive(x), Value::Reactive(y)) => x.ptr_eq(y),
        (Value::Ref(x), Value::Ref(y)) => x.ptr_eq(y),
        _ => false,
    }
}

/// Whether writing `value` over `old` counts as a change.
pub fn has_changed(value: &Value, old: &Value) -> bool {
    !same_value(value, old)
}

pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

pub fn is_array(value: &Value) -> bool {
    value.is_array()
}

/// Wrap a raw object in a reactive proxy; other values pass through.
pub fn to_reactive(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Reactive(Reactive::new(object)),
        other => other,
    }
}

/// Unwrap a reactive proxy to its raw object; other values pass through.
pub fn to_raw(value: Value) -> Value {
    match value {
        Value::Reactive(proxy) => Value::Object(proxy.raw().clone()),
        other => other,
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Reactive> for Value {
    fn from(proxy: Reactive) -> Self {
        Value::Reactive(proxy)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::Object(Object::array(items)),
            serde_json::Value::Object(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

/// Whether an object behaves as a keyed record or an indexed list.
///
/// Both kinds store their slots the same way; the kind only answers
/// [`Object::is_array`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Plain,
    Array,
}

struct ObjectInner {
    id: TargetId,
    kind: ObjectKind,
    props: RwLock<IndexMap<Key, Value>>,
    frozen: AtomicBool,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        graph::forget_target(self.id);
    }
}

/// A shared raw object: an insertion-ordered map from [`Key`] to [`Value`].
///
/// Cloning an `Object` creates a new handle to the same storage. The
/// object's [`TargetId`] is its identity in the dependency graph.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    /// Create an empty plain object.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Plain, IndexMap::new())
    }

    /// Create an array object holding `items` under keys `0..n`.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let props = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (Key::Index(index), item.into()))
            .collect();
        Self::with_kind(ObjectKind::Array, props)
    }

    fn with_kind(kind: ObjectKind, props: IndexMap<Key, Value>) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: TargetId::new(),
                kind,
                props: RwLock::new(props),
                frozen: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.inner.kind
    }

    pub fn is_array(&self) -> bool {
        self.inner.kind == ObjectKind::Array
    }

    /// Read a slot without tracking. Missing keys read as `Undefined`.
    pub fn get_raw(&self, key: &Key) -> Value {
        self.inner.props.read().get(key).cloned().unwrap_or_default()
    }

    /// Write a slot without triggering, returning the previous value.
    pub fn set_raw(&self, key: Key, value: Value) -> Result<Option<Value>> {
        if self.is_frozen() {
            return Err(ReactiveError::Frozen { key });
        }
        Ok(self.inner.props.write().insert(key, value))
    }

    pub fn has(&self, key: &Key) -> bool {
        self.inner.props.read().contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.props.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.props.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.props.read().is_empty()
    }

    /// Reject all further writes.
    pub fn freeze(&self) {
        self.inner.frozen.store(true, Ordering::SeqCst);
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::SeqCst)
    }

    /// Check whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Snapshot as JSON. Arrays keep insertion order of their slots.
    pub fn to_json(&self) -> serde_json::Value {
        let props = self.inner.props.read();
        match self.inner.kind {
            ObjectKind::Array => {
                serde_json::Value::Array(props.values().map(Value::to_json).collect())
            }
            ObjectKind::Plain => serde_json::Value::Object(
                props
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<Key>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let props = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::with_kind(ObjectKind::Plain, props)
    }
}

impl TryFrom<serde_json::Value> for Object {
    type Error = ReactiveError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match Value::from(json) {
            Value::Object(object) => Ok(object),
            other => Err(ReactiveError::NotAnObject {
                found: other.kind_name(),
            }),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("len", &self.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_value_treats_nan_as_equal() {
        assert!(same_value(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(has_changed(&Value::from(f64::NAN), &Value::from(1.0)));
    }

    #[test]
    fn same_value_distinguishes_signed_zero() {
        assert!(has_changed(&Value::from(-0.0), &Value::from(0.0)));
        assert!(!has_changed(&Value::from(0.0), &Value::from(0)));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Object::from_iter([("x", 1)]);
        let b = Object::from_iter([("x", 1)]);

        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn different_kinds_are_never_equal() {
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(Value::from(false), Value::from(0));
    }

    #[test]
    fn missing_keys_read_undefined() {
        let object = Object::new();
        assert!(object.get_raw(&Key::from("nope")).is_undefined());
        assert!(!object.has(&Key::from("nope")));
    }

    #[test]
    fn set_raw_returns_previous_value() {
        let object = Object::new();
        assert_eq!(object.set_raw(Key::from("a"), Value::from(1)), Ok(None));
        assert_eq!(
            object.set_raw(Key::from("a"), Value::from(2)),
            Ok(Some(Value::from(1)))
        );
        assert_eq!(object.get_raw(&Key::from("a")), Value::from(2));
    }

    #[test]
    fn frozen_object_rejects_writes() {
        let object = Object::from_iter([("a", 1)]);
        object.freeze();

        let err = object.set_raw(Key::from("a"), Value::from(2)).unwrap_err();
        assert_eq!(err, ReactiveError::Frozen { key: Key::from("a") });
        assert_eq!(object.get_raw(&Key::from("a")), Value::from(1));
    }

    #[test]
    fn array_uses_index_keys() {
        let list = Object::array([10, 20, 30]);
        assert!(list.is_array());
        assert_eq!(list.len(), 3);
        assert_eq!(list.get_raw(&Key::from(1usize)), Value::from(20));
        assert!(Value::from(list).is_array());
    }

    #[test]
    fn converts_from_json() {
        let object = Object::try_from(json!({
            "name": "ada",
            "tags": ["a", "b"],
            "nested": { "depth": 2 }
        }))
        .unwrap();

        assert_eq!(object.keys(), vec![Key::from("name"), Key::from("tags"), Key::from("nested")]);
        assert_eq!(object.get_raw(&Key::from("name")).as_str(), Some("ada"));
        assert!(object.get_raw(&Key::from("tags")).is_array());
        assert!(object.get_raw(&Key::from("nested")).is_object());
    }

    #[test]
    fn non_object_json_is_rejected() {
        let err = Object::try_from(json!(3)).unwrap_err();
        assert_eq!(err, ReactiveError::NotAnObject { found: "number" });
    }

    #[test]
    fn json_snapshot_round_trips_structure() {
        let source = json!({ "a": 1.5, "list": [true, null, "x"] });
        let object = Object::try_from(source.clone()).unwrap();
        assert_eq!(object.to_json(), source);
    }

    #[test]
    fn to_reactive_and_to_raw_are_inverse_on_objects() {
        let object = Object::new();
        let wrapped = to_reactive(Value::from(object.clone()));
        assert!(wrapped.is_reactive());
        assert_eq!(to_raw(wrapped), Value::from(object));
        assert_eq!(to_reactive(Value::from(5)), Value::from(5));
    }

    #[test]
    fn key_display() {
        assert_eq!(Key::from("name").to_string(), "name");
        assert_eq!(Key::from(3usize).to_string(), "3");
        assert!(Key::from(3usize).is_index());
    }
}
