//! # The Hypergraph Store (C2)
//!
//! `AtomSpace` is the content-addressed hypergraph: atoms go in once per
//! distinct identity, links can only reference atoms already present
//! (closure), and removing an atom cascades to everything whose closure
//! depends on it. Reads (including pattern-matcher enumeration) can run
//! fully in parallel; mutations take a single writer lock so all five
//! indexes stay coherent within one critical section. Grounded on
//! `qc-02::service::storage`'s service-over-ports composition and
//! `qc-04::domain::cache`'s reader/writer discipline.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::domain::atom::{Atom, AtomKey, Handle};
use crate::domain::errors::{AtomSpaceError, StorageError};
use crate::domain::index::{AtomTable, Indexes};
use crate::domain::truth_value::TruthValue;
use crate::domain::type_hierarchy::{TypeHierarchy, TypeId};
use crate::ports::storage::{to_record, BackendStats, StorageNode};

/// Construction-time knobs for an `AtomSpace`. No file/env loading: the
/// embedding host builds one of these directly (spec.md §1 excludes
/// configuration-loading machinery).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Hint for the primary table's initial shard capacity.
    pub initial_capacity: usize,
    /// Whether mutations write through to attached backends synchronously
    /// (true) or are only applied in memory until `flush` is called
    /// (false).
    pub write_through: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            write_through: true,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StoreStats {
    pub atom_count: u64,
    pub node_count: u64,
    pub link_count: u64,
    pub backend_count: u64,
}

struct BackendSlot {
    node: Box<dyn StorageNode>,
    degraded: bool,
}

/// The hypergraph store itself.
pub struct AtomSpace {
    atoms: AtomTable,
    indexes: RwLock<Indexes>,
    types: RwLock<TypeHierarchy>,
    next_handle: AtomicU64,
    backends: RwLock<Vec<BackendSlot>>,
    /// Type restriction (if any) for handles that are `VARIABLE_NODE`
    /// atoms, parsed once at construction (see SPEC_FULL.md §2.1/§10).
    var_restrictions: RwLock<HashMap<Handle, Option<TypeId>>>,
    config: StoreConfig,
}

impl AtomSpace {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            atoms: AtomTable::with_capacity(config.initial_capacity),
            indexes: RwLock::new(Indexes::new()),
            types: RwLock::new(TypeHierarchy::new()),
            next_handle: AtomicU64::new(1),
            backends: RwLock::new(Vec::new()),
            var_restrictions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a `VARIABLE_NODE` atom, optionally restricted to a subtype
    /// of `restriction` when unified by the pattern matcher.
    pub fn add_variable(
        &self,
        var_type: TypeId,
        name: impl Into<String>,
        restriction: Option<TypeId>,
    ) -> Handle {
        let handle = self.add_node(var_type, name, TruthValue::DEFAULT);
        self.var_restrictions.write().insert(handle, restriction);
        handle
    }

    /// The type restriction registered for `handle` via `add_variable`,
    /// if any was registered (`None` means "not a restricted variable",
    /// distinct from `Some(None)` meaning "variable with no restriction").
    pub fn variable_restriction(&self, handle: Handle) -> Option<Option<TypeId>> {
        self.var_restrictions.read().get(&handle).copied()
    }

    pub fn type_hierarchy(&self) -> &RwLock<TypeHierarchy> {
        &self.types
    }

    /// Attach a persistence backend. Does not load its contents; call
    /// `restore_from` explicitly if that's desired.
    pub fn attach_backend(&self, node: Box<dyn StorageNode>) {
        self.backends.write().push(BackendSlot { node, degraded: false });
    }

    fn type_name(&self, atom_type: TypeId) -> String {
        self.types
            .read()
            .name_of(atom_type)
            .unwrap_or("Unknown")
            .to_string()
    }

    fn write_through(&self, atom: &Atom) {
        if !self.config.write_through {
            return;
        }
        let type_name = self.type_name(atom.atom_type);
        let record = to_record(atom, &type_name);
        let mut backends = self.backends.write();
        for slot in backends.iter_mut() {
            match slot.node.store_atom(&record) {
                Ok(()) => slot.degraded = false,
                Err(e) => {
                    slot.degraded = true;
                    tracing::warn!(error = %e, "storage backend degraded on write-through");
                }
            }
        }
    }

    /// Insert (or merge with an existing identical) node atom.
    ///
    /// ## Invariant
    /// If a node with this exact `(atom_type, name)` already exists, its
    /// handle is returned unchanged and the truth values are merged — the
    /// identity is never rebound to a new handle.
    pub fn add_node(&self, atom_type: TypeId, name: impl Into<String>, tv: TruthValue) -> Handle {
        let name = name.into();
        let key = AtomKey::Node { atom_type, name: name.clone() };
        let existing = self.indexes.read().lookup_key(&key);
        if let Some(handle) = existing {
            self.merge_truth_value(handle, tv);
            return handle;
        }
        let handle = Handle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let atom = Atom::new_node(handle, atom_type, name, tv);
        self.indexes.write().on_insert(&atom);
        self.write_through(&atom);
        self.atoms.insert(handle, atom);
        handle
    }

    /// Insert (or merge with an existing identical) link atom.
    ///
    /// ## Invariant (closure)
    /// Every handle in `outgoing` must already exist in this space;
    /// otherwise `InvalidArgument` is returned and nothing is inserted.
    pub fn add_link(
        &self,
        atom_type: TypeId,
        outgoing: Vec<Handle>,
        tv: TruthValue,
    ) -> Result<Handle, AtomSpaceError> {
        for h in &outgoing {
            if !self.atoms.contains_key(h) {
                return Err(AtomSpaceError::InvalidArgument(format!(
                    "outgoing handle {h:?} does not exist in this space"
                )));
            }
        }
        let key = AtomKey::Link { atom_type, outgoing: outgoing.clone() };
        let existing = self.indexes.read().lookup_key(&key);
        if let Some(handle) = existing {
            self.merge_truth_value(handle, tv);
            return Ok(handle);
        }
        let handle = Handle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let atom = Atom::new_link(handle, atom_type, outgoing, tv);
        self.indexes.write().on_insert(&atom);
        self.write_through(&atom);
        self.atoms.insert(handle, atom);
        Ok(handle)
    }

    fn merge_truth_value(&self, handle: Handle, tv: TruthValue) {
        if let Some(mut atom) = self.atoms.get_mut(&handle) {
            atom.tv = atom.tv.merge(&tv);
            let snapshot = atom.clone();
            drop(atom);
            self.write_through(&snapshot);
        }
    }

    pub fn get(&self, handle: Handle) -> Option<Atom> {
        self.atoms.get(&handle).map(|a| a.clone())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.atoms.contains_key(&handle)
    }

    /// Directly overwrite an atom's truth value (as opposed to merging).
    pub fn set_truth_value(&self, handle: Handle, tv: TruthValue) -> Result<(), AtomSpaceError> {
        match self.atoms.get_mut(&handle) {
            Some(mut atom) => {
                atom.tv = tv;
                let snapshot = atom.clone();
                drop(atom);
                self.write_through(&snapshot);
                Ok(())
            }
            None => Err(AtomSpaceError::NotFound(handle)),
        }
    }

    /// Look up an existing link by identity without inserting it — used by
    /// the rule engine to check whether a premise already holds before
    /// proposing it as something to prove.
    pub fn find_link(&self, atom_type: TypeId, outgoing: &[Handle]) -> Option<Handle> {
        self.indexes.read().lookup_key(&AtomKey::Link {
            atom_type,
            outgoing: outgoing.to_vec(),
        })
    }

    /// Look up an existing node by identity without inserting it.
    pub fn find_node(&self, atom_type: TypeId, name: &str) -> Option<Handle> {
        self.indexes.read().lookup_key(&AtomKey::Node {
            atom_type,
            name: name.to_string(),
        })
    }

    pub fn incoming_set(&self, handle: Handle) -> Vec<Handle> {
        self.indexes.read().incoming_set(handle).to_vec()
    }

    /// All atoms of exactly `atom_type` (use `TypeHierarchy::is_a` over
    /// the result, or call `get_by_type_inclusive`, for subtype-aware
    /// enumeration).
    pub fn get_by_type(&self, atom_type: TypeId) -> Vec<Handle> {
        self.indexes.read().by_type(atom_type).to_vec()
    }

    /// All atoms whose type is `atom_type` or a descendant of it.
    pub fn get_by_type_inclusive(&self, atom_type: TypeId) -> Vec<Handle> {
        let types = self.types.read();
        self.atoms
            .iter()
            .filter(|entry| types.is_a(entry.atom_type, atom_type))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Remove an atom and cascade to everything whose closure depends on
    /// it (every link, transitively, that references it in its outgoing
    /// set).
    pub fn remove(&self, handle: Handle) -> Result<Vec<Handle>, AtomSpaceError> {
        if !self.atoms.contains_key(&handle) {
            return Err(AtomSpaceError::NotFound(handle));
        }
        let mut to_remove = vec![handle];
        let mut seen = HashSet::new();
        seen.insert(handle);
        let mut frontier = vec![handle];
        while let Some(h) = frontier.pop() {
            for referrer in self.indexes.read().incoming_set(h).to_vec() {
                if seen.insert(referrer) {
                    to_remove.push(referrer);
                    frontier.push(referrer);
                }
            }
        }
        let mut indexes = self.indexes.write();
        let mut backends = self.backends.write();
        let mut removed = Vec::with_capacity(to_remove.len());
        for h in &to_remove {
            if let Some((_, atom)) = self.atoms.remove(h) {
                indexes.on_remove(&atom);
                for slot in backends.iter_mut() {
                    if let Err(e) = slot.node.delete_atom(atom.handle) {
                        slot.degraded = true;
                        tracing::warn!(error = %e, "storage backend degraded on delete");
                    }
                }
                removed.push(atom.handle);
            }
        }
        Ok(removed)
    }

    pub fn stats(&self) -> StoreStats {
        let mut node_count = 0u64;
        let mut link_count = 0u64;
        for entry in self.atoms.iter() {
            if entry.is_node() {
                node_count += 1;
            } else {
                link_count += 1;
            }
        }
        StoreStats {
            atom_count: self.atoms.len() as u64,
            node_count,
            link_count,
            backend_count: self.backends.read().len() as u64,
        }
    }

    pub fn backend_stats(&self) -> Vec<BackendStats> {
        self.backends.read().iter().map(|s| s.node.stats()).collect()
    }

    /// Push a full snapshot of the current graph to every attached
    /// backend, regardless of `write_through`. A backend that fails is
    /// flagged `degraded` but does not fail the others.
    pub fn flush(&self) -> Result<(), AtomSpaceError> {
        let records: Vec<_> = self
            .atoms
            .iter()
            .map(|entry| to_record(&entry, &self.type_name(entry.atom_type)))
            .collect();
        let mut backends = self.backends.write();
        if backends.is_empty() {
            return Ok(());
        }
        let mut any_ok = false;
        for slot in backends.iter_mut() {
            match slot.node.store_graph(&records) {
                Ok(()) => {
                    slot.degraded = false;
                    any_ok = true;
                }
                Err(e) => {
                    slot.degraded = true;
                    tracing::warn!(error = %e, "storage backend degraded on flush");
                }
            }
        }
        if any_ok {
            Ok(())
        } else {
            Err(AtomSpaceError::StorageUnavailable("all backends failed to flush".to_string()))
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl Default for AtomSpace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::type_hierarchy::AtomType;

    fn space() -> AtomSpace {
        AtomSpace::new()
    }

    fn concept(space: &AtomSpace) -> TypeId {
        space.types.read().id_of(AtomType::CONCEPT_NODE).unwrap()
    }

    fn inheritance(space: &AtomSpace) -> TypeId {
        space.types.read().id_of(AtomType::INHERITANCE_LINK).unwrap()
    }

    #[test]
    fn add_node_is_idempotent_on_identity() {
        let s = space();
        let c = concept(&s);
        let a = s.add_node(c, "dog", TruthValue::DEFAULT);
        let b = s.add_node(c, "dog", TruthValue::TRUE);
        assert_eq!(a, b);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn add_node_merges_truth_value() {
        let s = space();
        let c = concept(&s);
        let h = s.add_node(c, "dog", TruthValue::new(0.5, 0.5));
        s.add_node(c, "dog", TruthValue::new(0.5, 0.5));
        let merged = s.get(h).unwrap();
        assert!((merged.tv.strength - 0.5).abs() < 1e-9);
        assert!(merged.tv.confidence > 0.5);
    }

    #[test]
    fn add_link_requires_closure() {
        let s = space();
        let inh = inheritance(&s);
        let result = s.add_link(inh, vec![Handle(999)], TruthValue::DEFAULT);
        assert!(matches!(result, Err(AtomSpaceError::InvalidArgument(_))));
    }

    #[test]
    fn cascading_delete_removes_dependent_links() {
        let s = space();
        let c = concept(&s);
        let inh = inheritance(&s);
        let dog = s.add_node(c, "dog", TruthValue::DEFAULT);
        let animal = s.add_node(c, "animal", TruthValue::DEFAULT);
        let link = s.add_link(inh, vec![dog, animal], TruthValue::DEFAULT).unwrap();
        let removed = s.remove(dog).unwrap();
        assert!(removed.contains(&dog));
        assert!(removed.contains(&link));
        assert!(!s.contains(link));
        assert!(s.contains(animal));
    }

    #[test]
    fn incoming_set_reflects_links() {
        let s = space();
        let c = concept(&s);
        let inh = inheritance(&s);
        let dog = s.add_node(c, "dog", TruthValue::DEFAULT);
        let animal = s.add_node(c, "animal", TruthValue::DEFAULT);
        let link = s.add_link(inh, vec![dog, animal], TruthValue::DEFAULT).unwrap();
        assert_eq!(s.incoming_set(dog), vec![link]);
    }

    #[test]
    fn stats_counts_nodes_and_links() {
        let s = space();
        let c = concept(&s);
        let inh = inheritance(&s);
        let dog = s.add_node(c, "dog", TruthValue::DEFAULT);
        let animal = s.add_node(c, "animal", TruthValue::DEFAULT);
        s.add_link(inh, vec![dog, animal], TruthValue::DEFAULT).unwrap();
        let stats = s.stats();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.link_count, 1);
    }
}
