//! Effect Implementation
//!
//! An Effect is a re-runnable computation that subscribes to whatever it
//! reads while it runs.
//!
//! # How Effects Work
//!
//! 1. Unless created lazily, the effect runs its function immediately to
//!    establish initial dependencies.
//!
//! 2. While the function runs the effect is the active effect, so every
//!    tracked read inserts it into that slot's Dep.
//!
//! 3. When a slot is triggered, the effect runs its scheduler if it has
//!    one, or re-runs its function otherwise.
//!
//! # Lifetime
//!
//! Deps reference effects weakly. The [`EffectRunner`] returned by
//! [`effect`] owns the effect: once every runner clone is dropped the
//! effect stops reacting and is pruned from its Deps on the next trigger.
//!
//! Dependencies are not cleared between runs. A read that only happened on
//! an earlier run still re-dispatches the effect; [`EffectRunner::stop`]
//! removes the effect from every Dep it was recorded in.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::context::{ActiveEffect, ReactiveContext};
use super::subscriber::{EffectId, EffectKind, Scheduler, Subscriber};
use crate::graph::{Dep, WeakDep};

/// Options applied to an effect at creation.
#[derive(Clone, Default)]
pub struct EffectOptions {
    /// Skip the initial run.
    pub lazy: bool,

    /// Called instead of re-running the effect when a dependency triggers.
    pub scheduler: Option<Scheduler>,

    /// Allow a trigger raised by the effect's own run to dispatch it again.
    pub allow_recurse: bool,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn with_scheduler<F>(mut self, scheduler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    pub fn allow_recurse(mut self) -> Self {
        self.allow_recurse = true;
        self
    }
}

impl fmt::Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("lazy", &self.lazy)
            .field("scheduler", &self.scheduler.is_some())
            .field("allow_recurse", &self.allow_recurse)
            .finish()
    }
}

/// A tracked, re-runnable computation.
pub struct ReactiveEffect<T> {
    id: EffectId,
    kind: EffectKind,
    func: Box<dyn Fn() -> T + Send + Sync>,
    scheduler: Option<Scheduler>,
    allow_recurse: bool,
    active: AtomicBool,
    run_count: AtomicUsize,
    /// Deps this effect has been inserted into. Dead entries are pruned
    /// whenever a new Dep is recorded.
    deps: Mutex<Vec<WeakDep>>,
    this: Weak<Self>,
}

impl<T: 'static> ReactiveEffect<T> {
    pub(crate) fn new<F>(func: F, kind: EffectKind, options: &EffectOptions) -> Arc<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Arc::new_cyclic(|this| Self {
            id: EffectId::new(),
            kind,
            func: Box::new(func),
            scheduler: options.scheduler.clone(),
            allow_recurse: options.allow_recurse,
            active: AtomicBool::new(true),
            run_count: AtomicUsize::new(0),
            deps: Mutex::new(Vec::new()),
            this: this.clone(),
        })
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of tracked runs so far.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }

    /// Number of live Deps this effect is subscribed to.
    pub fn dep_count(&self) -> usize {
        self.deps.lock().iter().filter(|dep| !dep.is_dead()).count()
    }

    /// Run the function as the active effect and return its result.
    ///
    /// A stopped effect still runs its function, but with tracking paused.
    pub fn run(&self) -> T {
        if !self.is_active() {
            let _paused = ReactiveContext::pause();
            return (self.func)();
        }

        let handle: Weak<dyn Subscriber> = self.this.clone();
        let _ctx = ReactiveContext::enter(ActiveEffect {
            id: self.id,
            handle,
        });
        self.run_count.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(effect = self.id.raw(), kind = ?self.kind, "running effect");
        (self.func)()
    }

    /// Deactivate the effect and unsubscribe it from every Dep.
    pub fn stop(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        let deps = std::mem::take(&mut *self.deps.lock());
        let mut removed = 0;
        for dep in deps.iter().filter_map(WeakDep::upgrade) {
            dep.remove(self.id);
            removed += 1;
        }
        debug!(effect = self.id.raw(), deps = removed, "stopped effect");
    }

    pub(crate) fn subscriber_handle(&self) -> Weak<dyn Subscriber> {
        self.this.clone()
    }
}

impl<T: 'static> Subscriber for ReactiveEffect<T> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn kind(&self) -> EffectKind {
        self.kind
    }

    fn scheduler(&self) -> Option<Scheduler> {
        self.scheduler.clone()
    }

    fn allows_recurse(&self) -> bool {
        self.allow_recurse
    }

    fn is_active(&self) -> bool {
        ReactiveEffect::is_active(self)
    }

    fn rerun(&self) {
        self.run();
    }

    fn record_dep(&self, dep: &Dep) {
        let mut deps = self.deps.lock();
        deps.retain(|recorded| !recorded.is_dead());
        deps.push(dep.downgrade());
    }
}

impl<T> fmt::Debug for ReactiveEffect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.active.load(Ordering::SeqCst))
            .field("run_count", &self.run_count.load(Ordering::SeqCst))
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

/// Owning handle to an effect, returned by [`effect`].
#[must_use = "the effect stops reacting once its runner is dropped"]
pub struct EffectRunner<T> {
    effect: Arc<ReactiveEffect<T>>,
}

impl<T: 'static> EffectRunner<T> {
    /// Re-run the effect manually and return its result.
    pub fn run(&self) -> T {
        self.effect.run()
    }

    pub fn stop(&self) {
        self.effect.stop();
    }

    pub fn id(&self) -> EffectId {
        self.effect.id()
    }

    pub fn is_active(&self) -> bool {
        self.effect.is_active()
    }

    pub fn run_count(&self) -> usize {
        self.effect.run_count()
    }

    pub fn effect(&self) -> &ReactiveEffect<T> {
        &self.effect
    }

    pub(crate) fn subscriber_handle(&self) -> Weak<dyn Subscriber> {
        self.effect.subscriber_handle()
    }
}

impl<T> Clone for EffectRunner<T> {
    fn clone(&self) -> Self {
        Self {
            effect: Arc::clone(&self.effect),
        }
    }
}

impl<T> fmt::Debug for EffectRunner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectRunner").field(&self.effect).finish()
    }
}

/// Create an effect and run it once immediately.
pub fn effect<T, F>(f: F) -> EffectRunner<T>
where
    F: Fn() -> T + Send + Sync + 'static,
    T: 'static,
{
    effect_with(f, EffectOptions::default())
}

/// Create an effect with explicit options.
pub fn effect_with<T, F>(f: F, options: EffectOptions) -> EffectRunner<T>
where
    F: Fn() -> T + Send + Sync + 'static,
    T: 'static,
{
    let effect = ReactiveEffect::new(f, EffectKind::Plain, &options);
    debug!(
        effect = effect.id().raw(),
        lazy = options.lazy,
        scheduler = options.scheduler.is_some(),
        "created effect"
    );
    if !options.lazy {
        effect.run();
    }
    EffectRunner { effect }
}

/// Stop the effect behind `runner`.
pub fn stop<T: 'static>(runner: &EffectRunner<T>) {
    runner.stop();
}
