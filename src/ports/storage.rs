//! # Persistence Contract (C3)
//!
//! `StorageNode` is the abstract interface an `AtomSpace` writes through
//! to and can load a graph back from. Grounded directly on
//! `qc-02::ports::outbound::{KeyValueStore, BlockSerializer, TimeSource}`:
//! the same split between "what to store" (atoms/graphs) and "how" (the
//! concrete adapter) holds here. Implementations are provided in
//! `adapters::storage`; a RocksDB/SQL/Postgres-backed adapter is left to
//! the embedding host (see SPEC_FULL.md §5).

use std::collections::HashMap;

use crate::domain::atom::{Atom, Handle};
use crate::domain::errors::StorageError;

/// A single persisted atom record: enough to reconstruct an `Atom`
/// without depending on any particular `TypeHierarchy` instance (the type
/// is stored by name, resolved against the hierarchy on load).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AtomRecord {
    pub handle: u64,
    pub type_name: String,
    pub name: Option<String>,
    pub outgoing: Vec<u64>,
    pub strength: f64,
    pub confidence: f64,
}

/// Aggregate stats a backend can report about itself.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BackendStats {
    pub atom_count: u64,
    pub connected: bool,
    pub backend_kind: String,
}

/// Abstract interface for a persistence backend attached to an
/// `AtomSpace`. Every operation is synchronous from the caller's
/// perspective; an adapter that needs asynchronous I/O queues internally
/// and surfaces backpressure as `StorageError::Degraded` rather than
/// blocking the writer critical section (spec §5).
pub trait StorageNode: Send + Sync {
    /// Establish the connection (open a file, connect to a database, ...).
    fn open(&mut self) -> Result<(), StorageError>;

    /// Release the connection. Idempotent.
    fn close(&mut self) -> Result<(), StorageError>;

    /// Whether the backend is currently usable.
    fn connected(&self) -> bool;

    /// Persist a single atom.
    fn store_atom(&mut self, record: &AtomRecord) -> Result<(), StorageError>;

    /// Fetch a single atom by handle.
    fn fetch_atom(&self, handle: Handle) -> Result<Option<AtomRecord>, StorageError>;

    /// Remove a single atom.
    fn delete_atom(&mut self, handle: Handle) -> Result<(), StorageError>;

    /// Persist an entire graph snapshot (used for bulk save/export).
    fn store_graph(&mut self, records: &[AtomRecord]) -> Result<(), StorageError>;

    /// Load an entire graph snapshot (used for bulk restore/import).
    fn load_graph(&self) -> Result<Vec<AtomRecord>, StorageError>;

    /// Introspection hook, mirroring `qc-02`'s `StorageNode::stats()`.
    fn stats(&self) -> BackendStats;
}

/// Build an `AtomRecord` from a live `Atom`, resolving its type to a
/// stable name via the hierarchy.
pub fn to_record(atom: &Atom, type_name: &str) -> AtomRecord {
    AtomRecord {
        handle: atom.handle.0,
        type_name: type_name.to_string(),
        name: atom.name().map(|s| s.to_string()),
        outgoing: atom.outgoing().iter().map(|h| h.0).collect(),
        strength: atom.tv.strength,
        confidence: atom.tv.confidence,
    }
}

/// In-memory record table shared by adapters that don't need a real
/// backing store (kept as a free function so both the memory and file
/// adapters can reuse the same shape without inheritance).
pub fn index_by_handle(records: Vec<AtomRecord>) -> HashMap<u64, AtomRecord> {
    records.into_iter().map(|r| (r.handle, r)).collect()
}
