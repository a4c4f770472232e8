//! # Atoms
//!
//! An `Atom` is either a `Node` (identified by type + name) or a `Link`
//! (identified by type + an ordered tuple of outgoing atom handles). Its
//! identity is immutable — two atoms with the same identity *are* the same
//! atom — while its truth value is mutable and merged in place on
//! re-insertion. `Handle` is the cheap, opaque key everything else
//! (indexes, pattern bindings, rule targets) refers to an atom by; see
//! SPEC_FULL.md §2.1 for why it is a sequential counter rather than the
//! content hash itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::truth_value::{AttentionValue, TruthValue};
use crate::domain::type_hierarchy::TypeId;

/// Opaque, stable reference to an atom stored in an `AtomSpace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u64);

/// The content-derived identity key used to canonicalize insertion:
/// two atoms with the same `AtomKey` are the same atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomKey {
    Node { atom_type: TypeId, name: String },
    Link { atom_type: TypeId, outgoing: Vec<Handle> },
}

/// A node or a link. Identity (`atom_type`/`name`/`outgoing`) never
/// changes after construction; `tv` and `av` are mutated in place by
/// `AtomSpace::set_truth_value` and friends.
#[derive(Debug, Clone)]
pub struct Atom {
    pub handle: Handle,
    pub atom_type: TypeId,
    pub kind: AtomKind,
    pub tv: TruthValue,
    pub av: AttentionValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomKind {
    Node { name: String },
    Link { outgoing: Vec<Handle> },
}

impl Atom {
    pub fn new_node(handle: Handle, atom_type: TypeId, name: impl Into<String>, tv: TruthValue) -> Self {
        Self {
            handle,
            atom_type,
            kind: AtomKind::Node { name: name.into() },
            tv,
            av: AttentionValue::zero(),
        }
    }

    pub fn new_link(handle: Handle, atom_type: TypeId, outgoing: Vec<Handle>, tv: TruthValue) -> Self {
        Self {
            handle,
            atom_type,
            kind: AtomKind::Link { outgoing },
            tv,
            av: AttentionValue::zero(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self.kind, AtomKind::Node { .. })
    }

    pub fn is_link(&self) -> bool {
        matches!(self.kind, AtomKind::Link { .. })
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            AtomKind::Node { name } => Some(name.as_str()),
            AtomKind::Link { .. } => None,
        }
    }

    pub fn outgoing(&self) -> &[Handle] {
        match &self.kind {
            AtomKind::Link { outgoing } => outgoing.as_slice(),
            AtomKind::Node { .. } => &[],
        }
    }

    /// The canonicalizing identity key for this atom's content.
    pub fn key(&self) -> AtomKey {
        match &self.kind {
            AtomKind::Node { name } => AtomKey::Node {
                atom_type: self.atom_type,
                name: name.clone(),
            },
            AtomKind::Link { outgoing } => AtomKey::Link {
                atom_type: self.atom_type,
                outgoing: outgoing.clone(),
            },
        }
    }

    /// A stable content hash of this atom's identity (type + name, or
    /// type + outgoing handles). Used only as the hash bucket for the
    /// canonicalizing index, never exposed as the handle itself.
    pub fn content_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.atom_type.0.to_le_bytes());
        match &self.kind {
            AtomKind::Node { name } => {
                hasher.update([0u8]);
                hasher.update(name.as_bytes());
            }
            AtomKind::Link { outgoing } => {
                hasher.update([1u8]);
                for h in outgoing {
                    hasher.update(h.0.to_le_bytes());
                }
            }
        }
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::type_hierarchy::{AtomType, TypeHierarchy};

    #[test]
    fn node_identity_key_depends_on_type_and_name() {
        let h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let a = Atom::new_node(Handle(1), concept, "dog", TruthValue::DEFAULT);
        let b = Atom::new_node(Handle(2), concept, "dog", TruthValue::TRUE);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn link_identity_key_depends_on_outgoing_order() {
        let h = TypeHierarchy::new();
        let link_t = h.id_of(AtomType::LIST_LINK).unwrap();
        let a = Atom::new_link(Handle(1), link_t, vec![Handle(10), Handle(20)], TruthValue::DEFAULT);
        let b = Atom::new_link(Handle(2), link_t, vec![Handle(20), Handle(10)], TruthValue::DEFAULT);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn content_hash_is_deterministic() {
        let h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let a = Atom::new_node(Handle(1), concept, "dog", TruthValue::DEFAULT);
        let b = Atom::new_node(Handle(2), concept, "dog", TruthValue::TRUE);
        assert_eq!(a.content_hash(), b.content_hash());
    }
}
