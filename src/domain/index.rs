//! # Indexes
//!
//! The five indexes every `AtomSpace` maintains, kept in one struct so
//! `AtomSpace` can update them atomically within a single writer critical
//! section (spec §5 "Index coherence"). Grounded on
//! `qc-02::domain::storage::index::BlockIndex`'s sorted-vec discipline,
//! generalized from a single height key to the hypergraph's several keys.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::domain::atom::{Atom, AtomKey, Handle};
use crate::domain::type_hierarchy::TypeId;

/// All index structures an `AtomSpace` maintains alongside its primary
/// atom table.
#[derive(Default)]
pub struct Indexes {
    /// (type, outgoing)/(type, name) -> handle, for canonicalizing inserts.
    by_key: HashMap<AtomKey, Handle>,
    /// handle -> set of link handles that reference it in their outgoing list.
    incoming: HashMap<Handle, Vec<Handle>>,
    /// type -> all handles of that exact type (not including subtypes).
    by_type: HashMap<TypeId, Vec<Handle>>,
}

impl Indexes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_key(&self, key: &AtomKey) -> Option<Handle> {
        self.by_key.get(key).copied()
    }

    /// Record a newly-inserted atom across all secondary indexes. The
    /// handle->atom primary table itself lives in `AtomSpace`'s `DashMap`,
    /// not here.
    pub fn on_insert(&mut self, atom: &Atom) {
        self.by_key.insert(atom.key(), atom.handle);
        self.by_type.entry(atom.atom_type).or_default().push(atom.handle);
        for &target in atom.outgoing() {
            self.incoming.entry(target).or_default().push(atom.handle);
        }
    }

    /// Remove an atom from all secondary indexes. Does not touch the
    /// incoming sets of atoms *this* atom points to being removed too —
    /// the caller (AtomSpace::remove) drives the cascade and calls this
    /// once per atom actually deleted.
    pub fn on_remove(&mut self, atom: &Atom) {
        self.by_key.remove(&atom.key());
        if let Some(handles) = self.by_type.get_mut(&atom.atom_type) {
            handles.retain(|h| *h != atom.handle);
        }
        self.incoming.remove(&atom.handle);
        for &target in atom.outgoing() {
            if let Some(referrers) = self.incoming.get_mut(&target) {
                referrers.retain(|h| *h != atom.handle);
            }
        }
    }

    /// All links that reference `handle` in their outgoing list.
    pub fn incoming_set(&self, handle: Handle) -> &[Handle] {
        self.incoming.get(&handle).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All atoms of exactly `atom_type` (not subtypes — the caller
    /// combines this with `TypeHierarchy::is_a` for subtype-inclusive
    /// enumeration, matching spec's selectivity-ordering requirement that
    /// the most specific index be consulted first).
    pub fn by_type(&self, atom_type: TypeId) -> &[Handle] {
        self.by_type.get(&atom_type).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn type_count(&self, atom_type: TypeId) -> usize {
        self.by_type.get(&atom_type).map(|v| v.len()).unwrap_or(0)
    }
}

/// The primary handle -> atom table. A `DashMap` so concurrent readers
/// (matcher enumeration, rule-engine premise lookups) never contend with
/// each other, only briefly with a writer's shard lock during a mutation.
pub type AtomTable = DashMap<Handle, Atom>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::truth_value::TruthValue;
    use crate::domain::type_hierarchy::{AtomType, TypeHierarchy};

    #[test]
    fn insert_and_lookup_by_key() {
        let h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let atom = Atom::new_node(Handle(1), concept, "dog", TruthValue::DEFAULT);
        let mut idx = Indexes::new();
        idx.on_insert(&atom);
        assert_eq!(idx.lookup_key(&atom.key()), Some(Handle(1)));
        assert_eq!(idx.by_type(concept), &[Handle(1)]);
    }

    #[test]
    fn incoming_set_tracks_referrers() {
        let h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let link_t = h.id_of(AtomType::LIST_LINK).unwrap();
        let dog = Atom::new_node(Handle(1), concept, "dog", TruthValue::DEFAULT);
        let link = Atom::new_link(Handle(2), link_t, vec![Handle(1)], TruthValue::DEFAULT);
        let mut idx = Indexes::new();
        idx.on_insert(&dog);
        idx.on_insert(&link);
        assert_eq!(idx.incoming_set(Handle(1)), &[Handle(2)]);
    }

    #[test]
    fn remove_clears_all_secondary_indexes() {
        let h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let atom = Atom::new_node(Handle(1), concept, "dog", TruthValue::DEFAULT);
        let mut idx = Indexes::new();
        idx.on_insert(&atom);
        idx.on_remove(&atom);
        assert_eq!(idx.lookup_key(&atom.key()), None);
        assert_eq!(idx.by_type(concept), &[] as &[Handle]);
    }
}
