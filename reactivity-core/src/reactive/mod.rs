//! Reactive Primitives
//!
//! This module implements the reactive system on top of the dependency
//! graph: effects, reactive proxies, refs, and computeds.
//!
//! # Concepts
//!
//! ## Effects
//!
//! An effect is a function that re-runs whenever something it read changes.
//! Reads are recorded against whichever effect is running at the time, so
//! dependencies are discovered automatically.
//!
//! ## Reactive Proxies
//!
//! A [`Reactive`] wraps a plain object. Reading a property through it tracks
//! `(object, key)`; writing a property triggers it.
//!
//! ## Refs
//!
//! A [`Ref`] is a single reactive slot with its own dependency set. Writes
//! that do not change the value (under SameValue) notify nobody.
//!
//! ## Computeds
//!
//! A [`Computed`] is a lazily evaluated, cached derived value. It is marked
//! dirty when its inputs change and only recomputes when read.
//!
//! # Implementation Notes
//!
//! The running effect is kept on a thread-local stack. Nested effects push
//! onto it and pop when they finish, so the outer effect keeps tracking after
//! an inner one runs.

mod computed;
mod context;
mod effect;
mod proxy;
mod refs;
mod runtime;
pub(crate) mod subscriber;

pub use computed::{computed, Computed, ComputedOptions, Getter, Setter};
pub use context::{untracked, ReactiveContext};
pub use effect::{effect, effect_with, stop, EffectOptions, EffectRunner, ReactiveEffect};
pub use proxy::{is_reactive, reactive, Reactive};
pub use refs::{is_ref, ref_, shallow_ref, trigger_ref, unref, Ref};
pub use runtime::{track, track_effects, trigger, trigger_effects};
pub use subscriber::{EffectId, EffectKind, Scheduler};
