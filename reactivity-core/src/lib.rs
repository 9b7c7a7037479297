//! Reactivity Core
//!
//! This crate provides a fine-grained reactive dependency-tracking engine.
//! It implements:
//!
//! - A global dependency graph from observed slots to the effects reading them
//! - Effects that re-run when something they read changes
//! - Reactive proxies over dynamically typed objects
//! - Refs and lazily cached computeds
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: The dynamic value model (keys, values, raw objects)
//! - `graph`: Dependency sets and the target map
//! - `reactive`: Effects, track/trigger, proxies, refs and computeds
//! - `error`: The error type returned by fallible writes
//!
//! # Example
//!
//! ```rust
//! use reactivity_core::reactive::{computed, effect, ref_};
//!
//! // Create a ref
//! let count = ref_(0);
//!
//! // Create a derived value
//! let count_clone = count.clone();
//! let doubled = computed(move || count_clone.get().as_f64().unwrap_or_default() * 2.0);
//!
//! // Create an effect
//! let doubled_clone = doubled.clone();
//! let _runner = effect(move || {
//!     println!("Doubled: {}", doubled_clone.get());
//! });
//!
//! // Update the ref
//! count.set(5);
//! // Effect automatically runs, prints: "Doubled: 10"
//! assert_eq!(doubled.get(), 10.0);
//! ```

pub mod error;
pub mod graph;
pub mod reactive;
pub mod value;

pub use error::{ReactiveError, Result};
pub use reactive::{
    computed, effect, effect_with, reactive, ref_, shallow_ref, stop, track, trigger, untracked,
    Computed, EffectOptions, EffectRunner, Reactive, Ref,
};
pub use value::{Key, Object, Value};
