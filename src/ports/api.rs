//! # Inbound API (C6 query front-end)
//!
//! The primary surface the embedding host drives the store through.
//! Grounded on `qc-02::ports::inbound::BlockStorageApi`'s shape: one
//! trait naming every operation available to callers, with the domain
//! doing the actual enforcement.

use crate::domain::atom::Handle;
use crate::domain::errors::AtomSpaceError;
use crate::domain::matcher::MatchResult;
use crate::domain::query::Query;
use crate::domain::rules::backward::ChainResult;
use crate::domain::rules::forward::ForwardChainResult;
use crate::domain::rules::Deadline;
use crate::domain::store::StoreStats;
use crate::domain::truth_value::TruthValue;

/// Primary API surface for a running `AtomSpaceService`.
pub trait AtomSpaceApi {
    /// Run a parsed query (see `domain::query`) against the space.
    /// Returns the handles of the `SELECT`ed variables (in order) and one
    /// binding set per match, most-confident first — read a selected
    /// variable's value out of a result via `MatchResult::bindings`.
    fn query(&self, query: &Query) -> Result<(Vec<Handle>, Vec<MatchResult>), AtomSpaceError>;

    /// Attempt to prove `goal` via backward chaining within `deadline`.
    fn prove(&self, goal: Handle, deadline: Deadline) -> ChainResult;

    /// Saturate the registered forward rules to fixpoint (or until
    /// `deadline` cuts the pass short).
    fn saturate(&self, deadline: Deadline) -> ForwardChainResult;

    /// Directly overwrite an atom's truth value.
    fn set_truth_value(&self, handle: Handle, tv: TruthValue) -> Result<(), AtomSpaceError>;

    /// Remove an atom, cascading to everything whose closure depends on it.
    fn remove(&self, handle: Handle) -> Result<Vec<Handle>, AtomSpaceError>;

    /// Flush the in-memory graph to every attached, healthy backend.
    fn flush(&self) -> Result<(), AtomSpaceError>;

    /// Snapshot counters over the current graph and attached backends.
    fn stats(&self) -> StoreStats;
}
