//! # AtomSpace Core
//!
//! A hypergraph knowledge store and inference core. It holds typed atoms
//! (nodes and links) carrying truth values, indexes them for fast
//! structural lookup, matches patterns against the graph via unification,
//! and chains rules over it both forward (fixpoint saturation) and
//! backward (goal-directed, via a Backward Inference Tree).
//!
//! ## Architecture (Hexagonal)
//!
//! - `domain/` - Pure domain logic (atoms, indexes, store, matcher, rules)
//! - `ports/` - Port traits (inbound API, outbound persistence SPI)
//! - `adapters/` - Concrete persistence backends (in-memory, file)
//! - `service.rs` - Composition root wiring a store to its attached backends
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Content identity | Two atoms with equal type+name (nodes) or type+outgoing (links) are the same atom |
//! | 2 | Immutable identity, mutable truth | `add` of an existing atom merges truth values, never rebinds its handle |
//! | 3 | Closure | A link's outgoing atoms must already exist in the space |
//! | 4 | Cascading delete | Removing an atom removes everything whose closure depends on it |
//! | 5 | Index coherence | All five indexes are updated atomically within one writer critical section |
//! | 6 | Normal termination | Chainer/matcher timeouts and exhaustion return partial results, never panic |
//!
//! ## Usage
//!
//! ```ignore
//! use atomspace_core::{AtomSpace, AtomType, TruthValue};
//!
//! let space = AtomSpace::new();
//! let dog = space.add_node(AtomType::CONCEPT_NODE, "dog", TruthValue::DEFAULT);
//! let animal = space.add_node(AtomType::CONCEPT_NODE, "animal", TruthValue::DEFAULT);
//! let link = space.add_link(AtomType::INHERITANCE_LINK, vec![dog, animal], TruthValue::new(0.9, 0.8));
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export the core domain vocabulary for convenience.
pub use domain::atom::{Atom, AtomKey, Handle};
pub use domain::binding::Bindings;
pub use domain::errors::{AtomSpaceError, ChainError, MatchError, StorageError};
pub use domain::matcher::PatternMatcher;
pub use domain::query::{Clause, Query, Term};
pub use domain::rules::backward::{BackwardChainer, ChainResult};
pub use domain::rules::forward::{ForwardChainResult, ForwardChainer};
pub use domain::rules::strategy::Strategy;
pub use domain::rules::{ChainStatus, Deadline};
pub use domain::store::{AtomSpace, StoreConfig, StoreStats};
pub use domain::truth_value::{AttentionValue, TruthValue};
pub use domain::type_hierarchy::{AtomType, TypeHierarchy, TypeId};
pub use ports::api::AtomSpaceApi;
pub use ports::storage::StorageNode;
pub use service::AtomSpaceService;
