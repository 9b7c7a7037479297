//! Computed Implementation
//!
//! A Computed is a cached derived value whose getter runs inside a lazy
//! effect.
//!
//! # How Computeds Work
//!
//! 1. The getter does not run on creation. The computed starts dirty.
//!
//! 2. Reading a dirty computed clears the flag and runs the getter exactly
//!    once. Reading a clean computed returns the cached value.
//!
//! 3. When a dependency of the getter triggers, the internal effect's
//!    scheduler marks the computed dirty and dispatches the computed's own
//!    dependents. A computed that is already dirty dispatches nothing.
//!
//! Effects that read a computed depend on the computed itself, not on the
//! getter's dependencies.
//!
//! # Failure Modes
//!
//! - **Getter panics**: the panic propagates to the reader. The computed
//!   stays dirty, so the next read retries.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::effect::{EffectOptions, ReactiveEffect};
use super::refs::{track_ref_value, trigger_ref_value};
use super::subscriber::EffectKind;
use crate::error::{ReactiveError, Result};
use crate::graph::Dep;

pub type Getter<T> = Arc<dyn Fn() -> T + Send + Sync>;
pub type Setter<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Getter and optional setter of a computed.
///
/// Any `Fn() -> T` converts into options with no setter.
pub struct ComputedOptions<T> {
    get: Getter<T>,
    set: Option<Setter<T>>,
}

impl<T> ComputedOptions<T> {
    pub fn new<F>(get: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: None,
        }
    }

    pub fn with_setter<S>(mut self, set: S) -> Self
    where
        S: Fn(T) + Send + Sync + 'static,
    {
        self.set = Some(Arc::new(set));
        self
    }
}

impl<T, F> From<F> for ComputedOptions<T>
where
    F: Fn() -> T + Send + Sync + 'static,
{
    fn from(get: F) -> Self {
        Self::new(get)
    }
}

struct ComputedInner<T> {
    effect: Arc<ReactiveEffect<T>>,
    value: RwLock<Option<T>>,
    dirty: AtomicBool,
    dep: Mutex<Option<Dep>>,
    setter: Option<Setter<T>>,
}

impl<T> ComputedInner<T> {
    fn invalidate(&self) {
        if !self.dirty.swap(true, Ordering::SeqCst) {
            trace!("computed invalidated");
            trigger_ref_value(&self.dep);
        }
    }
}

/// Marks the computed dirty again if the getter unwinds.
struct DirtyOnUnwind<'a>(&'a AtomicBool);

impl Drop for DirtyOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.store(true, Ordering::SeqCst);
        }
    }
}

/// A cached derived value.
///
/// Cloning a `Computed` creates a new handle to the same cache.
pub struct Computed<T> {
    inner: Arc<ComputedInner<T>>,
}

/// Create a computed from a getter or from [`ComputedOptions`].
pub fn computed<T, O>(getter_or_options: O) -> Computed<T>
where
    T: Clone + Send + Sync + 'static,
    O: Into<ComputedOptions<T>>,
{
    Computed::new(getter_or_options)
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(options: impl Into<ComputedOptions<T>>) -> Self {
        let ComputedOptions { get, set } = options.into();

        let inner = Arc::new_cyclic(|weak: &Weak<ComputedInner<T>>| {
            let weak = weak.clone();
            let options = EffectOptions::new().lazy().with_scheduler(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.invalidate();
                }
            });
            ComputedInner {
                effect: ReactiveEffect::new(move || get(), EffectKind::Computed, &options),
                value: RwLock::new(None),
                dirty: AtomicBool::new(true),
                dep: Mutex::new(None),
                setter: set,
            }
        });

        Self { inner }
    }

    /// Read the value, recomputing it first if dirty.
    pub fn get(&self) -> T {
        track_ref_value(&self.inner.dep);

        if !self.inner.dirty.swap(false, Ordering::SeqCst) {
            if let Some(value) = self.inner.value.read().as_ref() {
                return value.clone();
            }
        }
        self.refresh()
    }

    fn refresh(&self) -> T {
        let _restore = DirtyOnUnwind(&self.inner.dirty);
        let value = self.inner.effect.run();
        *self.inner.value.write() = Some(value.clone());
        debug!(effect = self.inner.effect.id().raw(), "computed refreshed");
        value
    }

    /// Write through the setter.
    pub fn set(&self, value: T) -> Result<()> {
        match &self.inner.setter {
            Some(setter) => {
                setter(value);
                Ok(())
            }
            None => {
                warn!("write operation failed: computed value is readonly");
                Err(ReactiveError::ReadonlyComputed)
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    pub fn is_readonly(&self) -> bool {
        self.inner.setter.is_none()
    }

    /// Number of effects subscribed to this computed.
    pub fn dependent_count(&self) -> usize {
        self.inner.dep.lock().as_ref().map_or(0, Dep::len)
    }

    /// The internal effect that runs the getter.
    pub fn effect(&self) -> &ReactiveEffect<T> {
        &self.inner.effect
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("value", &*self.inner.value.read())
            .field("dirty", &self.inner.dirty.load(Ordering::SeqCst))
            .field("readonly", &self.inner.setter.is_none())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{effect, effect_with, ref_, Ref};
    use crate::value::Value;
    use std::sync::atomic::AtomicI32;

    fn number(r: &Ref) -> f64 {
        r.get().as_f64().unwrap_or_default()
    }

    #[test]
    fn computed_is_lazy() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let c = computed(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert!(c.is_dirty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(c.get(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!c.is_dirty());
    }

    #[test]
    fn computed_caches_value_when_clean() {
        let a = ref_(1);
        let calls = Arc::new(AtomicI32::new(0));

        let a_clone = a.clone();
        let calls_clone = calls.clone();
        let c = computed(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            number(&a_clone) + 1.0
        });

        assert_eq!(c.get(), 2.0);
        assert_eq!(c.get(), 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn computed_recomputes_once_after_change() {
        let a = ref_(1);
        let calls = Arc::new(AtomicI32::new(0));

        let a_clone = a.clone();
        let calls_clone = calls.clone();
        let c = computed(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            number(&a_clone) + 1.0
        });
        assert_eq!(c.get(), 2.0);

        a.set(number(&a) + 1.0);
        assert!(c.is_dirty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(c.get(), 3.0);
        assert_eq!(c.get(), 3.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn effects_depend_on_the_computed() {
        let a = ref_(1);
        let a_clone = a.clone();
        let c = computed(move || number(&a_clone) * 2.0);

        let seen = Arc::new(AtomicI32::new(0));
        let c_clone = c.clone();
        let seen_clone = seen.clone();
        let _runner = effect(move || {
            seen_clone.store(c_clone.get() as i32, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(c.dependent_count(), 1);
        // The effect never read `a` itself.
        assert_eq!(a.dependent_count(), 1);

        a.set(5);
        assert_eq!(seen.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn dirtying_is_idempotent() {
        let a = ref_(1);
        let a_clone = a.clone();
        let c = computed(move || number(&a_clone) + 1.0);

        let notified = Arc::new(AtomicI32::new(0));
        let c_clone = c.clone();
        let notified_clone = notified.clone();
        let _watcher = effect_with(
            move || {
                c_clone.get();
            },
            EffectOptions::new().with_scheduler(move || {
                notified_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        a.set(2);
        a.set(3);
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        assert_eq!(c.get(), 4.0);
        a.set(4);
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn computed_chains_propagate() {
        let a = ref_(1);
        let a_clone = a.clone();
        let doubled = computed(move || number(&a_clone) * 2.0);
        let doubled_clone = doubled.clone();
        let plus_ten = computed(move || doubled_clone.get() + 10.0);

        assert_eq!(plus_ten.get(), 12.0);

        a.set(5);
        assert!(doubled.is_dirty());
        assert!(plus_ten.is_dirty());
        assert_eq!(plus_ten.get(), 20.0);
    }

    #[test]
    fn readonly_computed_rejects_writes() {
        let c = computed(|| 1);
        assert!(c.is_readonly());
        assert_eq!(c.set(2), Err(ReactiveError::ReadonlyComputed));
    }

    #[test]
    fn setter_writes_through() {
        let a = ref_(1);
        let a_get = a.clone();
        let a_set = a.clone();
        let c: Computed<f64> = computed(
            ComputedOptions::new(move || number(&a_get) + 1.0)
                .with_setter(move |v: f64| a_set.set(v - 1.0)),
        );

        assert_eq!(c.get(), 2.0);
        c.set(10.0).unwrap();
        assert_eq!(a.get(), Value::from(9));
        assert_eq!(c.get(), 10.0);
    }

    #[test]
    fn panicking_getter_stays_dirty() {
        let fail = ref_(true);
        let fail_clone = fail.clone();
        let c = computed(move || {
            if fail_clone.get().as_bool().unwrap_or(false) {
                panic!("getter failed");
            }
            7
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| c.get()));
        assert!(result.is_err());
        assert!(c.is_dirty());
        assert_eq!(crate::reactive::ReactiveContext::depth(), 0);

        fail.set(false);
        assert_eq!(c.get(), 7);
    }

    #[test]
    fn computed_clone_shares_state() {
        let c1 = computed(|| 42);
        assert_eq!(c1.get(), 42);

        let c2 = c1.clone();
        assert!(!c2.is_dirty());
        assert_eq!(c2.get(), 42);
    }
}
