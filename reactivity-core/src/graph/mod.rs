//! Dependency Graph
//!
//! This module implements the global dependency graph that maps observed
//! slots to the effects that read them.
//!
//! # Overview
//!
//! The graph has two levels:
//!
//! - The top level maps an observed target (by [`TargetId`]) to its per-key
//!   table.
//! - Each per-key table maps a property [`Key`](crate::value::Key) to a
//!   [`Dep`], the set of effects that read that slot.
//!
//! Entries are created lazily the first time a slot is read inside an
//! effect. The graph never holds the target itself, only its id, and the
//! target removes its own entry when its last handle is dropped.
//!
//! Deps hold effects weakly. An effect that has been dropped is skipped and
//! pruned the next time its Dep is triggered.

mod dep;
mod target_map;

pub use dep::Dep;
pub(crate) use dep::WeakDep;
pub use target_map::{get_dep, get_or_create_dep, has_dep, is_tracked, tracked_key_count, TargetId};

pub(crate) use target_map::forget_target;
