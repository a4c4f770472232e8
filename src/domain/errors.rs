//! # Error Types
//!
//! One error kind table (spec §7), realized as `thiserror`-derived enums
//! the way `qc-07-bloom-filters::error::FilterError` composes a top-level
//! enum out of lower-level ones via `#[from]`.

use thiserror::Error;

use crate::domain::atom::Handle;

/// Top-level error returned by the public API.
#[derive(Debug, Error)]
pub enum AtomSpaceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("atom not found: {0:?}")]
    NotFound(Handle),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("operation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("search space exhausted after {steps} steps")]
    Exhausted { steps: u64 },

    #[error("conflicting operation: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("match error: {0}")]
    Match(#[from] MatchError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
}

/// Errors from the persistence contract (C3).
#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("backend not connected")]
    NotConnected,

    #[error("backend is degraded: {reason}")]
    Degraded { reason: String },

    #[error("atom not found in backend: {key}")]
    NotFound { key: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Errors from the pattern matcher (C4).
#[derive(Debug, Error, Clone)]
pub enum MatchError {
    #[error("unbound variable referenced in template: {0}")]
    UnboundVariable(String),

    #[error("type mismatch: expected subtype of {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("empty query has no clauses")]
    EmptyQuery,
}

/// Errors from the rule engine (C5).
#[derive(Debug, Error, Clone)]
pub enum ChainError {
    #[error("no applicable rule for goal")]
    NoApplicableRule,

    #[error("maximum depth {max_depth} exceeded")]
    DepthExceeded { max_depth: u32 },

    #[error("cyclic inference detected")]
    Cycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_converts_into_atomspace_error() {
        let e: AtomSpaceError = StorageError::NotConnected.into();
        assert!(matches!(e, AtomSpaceError::Storage(StorageError::NotConnected)));
    }

    #[test]
    fn display_messages_are_human_readable() {
        let e = AtomSpaceError::Timeout { elapsed_ms: 42 };
        assert_eq!(e.to_string(), "operation timed out after 42ms");
    }
}
