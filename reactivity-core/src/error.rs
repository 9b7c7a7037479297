//! Error types for reactive writes.
//!
//! Reads never fail: a missing active effect or a missing dependency entry
//! is an ordinary no-op. Only writes that the underlying target rejects
//! surface as errors.

use thiserror::Error;

use crate::value::Key;

/// Errors produced by reactive write operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactiveError {
    /// The target object was frozen, so the write was rejected and nothing
    /// was triggered.
    #[error("cannot set property `{key}`: target object is frozen")]
    Frozen {
        /// The key that was being written.
        key: Key,
    },

    /// A computed without a setter was written to.
    #[error("write operation failed: computed value is readonly")]
    ReadonlyComputed,

    /// A conversion expected an object or array.
    #[error("expected an object or array, found {found}")]
    NotAnObject {
        /// Name of the kind that was found instead.
        found: &'static str,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_error_names_the_key() {
        let err = ReactiveError::Frozen { key: Key::from("count") };
        assert_eq!(
            err.to_string(),
            "cannot set property `count`: target object is frozen"
        );
    }

    #[test]
    fn not_an_object_names_the_kind() {
        let err = ReactiveError::NotAnObject { found: "number" };
        assert_eq!(err.to_string(), "expected an object or array, found number");
    }
}
