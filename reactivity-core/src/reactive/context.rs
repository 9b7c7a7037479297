//! Reactive Context
//!
//! The reactive context tracks which effect is currently running, so that
//! reads can subscribe it without the caller naming it.
//!
//! # Implementation
//!
//! We use a thread-local stack. Running an effect pushes an entry and the
//! returned guard pops it on drop, so the previous effect becomes active
//! again after a nested run, including when the nested run panics.
//!
//! An entry may also be a pause marker pushed by [`untracked`]. While a
//! pause marker is on top, there is no active effect.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Weak;

use smallvec::SmallVec;

use super::subscriber::{EffectId, Subscriber};

thread_local! {
    static EFFECT_STACK: RefCell<SmallVec<[Option<ActiveEffect>; 8]>> =
        RefCell::new(SmallVec::new());
}

/// The effect on top of the stack.
#[derive(Clone)]
pub(crate) struct ActiveEffect {
    pub(crate) id: EffectId,
    pub(crate) handle: Weak<dyn Subscriber>,
}

/// Guard that pops the context when dropped.
///
/// The guard is tied to the thread whose stack it pushed onto.
pub struct ReactiveContext {
    effect_id: Option<EffectId>,
    _not_send: PhantomData<*const ()>,
}

impl ReactiveContext {
    /// Make `effect` the active effect until the guard drops.
    pub(crate) fn enter(effect: ActiveEffect) -> Self {
        let effect_id = Some(effect.id);
        EFFECT_STACK.with(|stack| stack.borrow_mut().push(Some(effect)));
        Self {
            effect_id,
            _not_send: PhantomData,
        }
    }

    /// Suspend tracking until the guard drops.
    pub(crate) fn pause() -> Self {
        EFFECT_STACK.with(|stack| stack.borrow_mut().push(None));
        Self {
            effect_id: None,
            _not_send: PhantomData,
        }
    }

    /// Check whether reads are currently being tracked.
    pub fn is_active() -> bool {
        EFFECT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// Number of entries on this thread's stack, pause markers included.
    pub fn depth() -> usize {
        EFFECT_STACK.with(|stack| stack.borrow().len())
    }

    /// ID of the active effect, if any.
    pub fn current_effect_id() -> Option<EffectId> {
        EFFECT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.as_ref().map(|effect| effect.id))
        })
    }

    /// ID of the innermost effect whose run is in progress.
    ///
    /// Unlike [`current_effect_id`](Self::current_effect_id), this looks
    /// through pause markers: an effect inside [`untracked`] is still running.
    pub fn running_effect_id() -> Option<EffectId> {
        EFFECT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find_map(|entry| entry.as_ref().map(|effect| effect.id))
        })
    }

    pub(crate) fn current() -> Option<ActiveEffect> {
        EFFECT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        EFFECT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                let popped_id = entry.map(|effect| effect.id);
                debug_assert_eq!(
                    popped_id, self.effect_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.effect_id, popped_id
                );
            }
        });
    }
}

/// Run `f` without subscribing the enclosing effect to anything it reads.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _paused = ReactiveContext::pause();
    f()
}
