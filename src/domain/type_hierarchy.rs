//! # Type Hierarchy
//!
//! Atom types form a single-rooted tree (`ATOM` at the root, `NODE` and
//! `LINK` below it, concrete types below those). `is_a` answers whether
//! one type is the same as or a descendant of another; this is what lets
//! the matcher treat `$x:CONCEPT` as "any atom whose type is-a
//! CONCEPT_NODE" and the pattern language stay agnostic to how deep a
//! caller's own vocabulary nests.

use std::collections::HashMap;

/// Opaque type identifier. Stable for the lifetime of a `TypeHierarchy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Built-in type name constants, resolved against a `TypeHierarchy` via
/// `TypeHierarchy::id_of`. Kept as `&'static str` rather than an enum so a
/// caller can register additional subtypes at runtime without this crate
/// knowing their names in advance.
#[allow(non_snake_case)]
pub mod AtomType {
    pub const ATOM: &str = "Atom";
    pub const NODE: &str = "Node";
    pub const LINK: &str = "Link";
    pub const CONCEPT_NODE: &str = "ConceptNode";
    pub const PREDICATE_NODE: &str = "PredicateNode";
    pub const VARIABLE_NODE: &str = "VariableNode";
    pub const INHERITANCE_LINK: &str = "InheritanceLink";
    pub const SUBSET_LINK: &str = "SubsetLink";
    pub const EVALUATION_LINK: &str = "EvaluationLink";
    pub const LIST_LINK: &str = "ListLink";
}

#[derive(Debug)]
struct TypeNode {
    name: String,
    parent: Option<TypeId>,
    is_node_kind: bool,
}

/// The runtime type tree: built-in types registered at construction,
/// extendable by callers via `register_subtype`.
#[derive(Debug)]
pub struct TypeHierarchy {
    nodes: Vec<TypeNode>,
    by_name: HashMap<String, TypeId>,
}

impl TypeHierarchy {
    /// Build the hierarchy with the standard built-in types pre-registered.
    pub fn new() -> Self {
        let mut h = Self {
            nodes: Vec::new(),
            by_name: HashMap::new(),
        };
        let atom = h.insert(AtomType::ATOM, None, false);
        let node = h.insert(AtomType::NODE, Some(atom), true);
        let link = h.insert(AtomType::LINK, Some(atom), false);
        h.insert(AtomType::CONCEPT_NODE, Some(node), true);
        h.insert(AtomType::PREDICATE_NODE, Some(node), true);
        h.insert(AtomType::VARIABLE_NODE, Some(node), true);
        h.insert(AtomType::INHERITANCE_LINK, Some(link), false);
        h.insert(AtomType::SUBSET_LINK, Some(link), false);
        h.insert(AtomType::EVALUATION_LINK, Some(link), false);
        h.insert(AtomType::LIST_LINK, Some(link), false);
        h
    }

    fn insert(&mut self, name: &str, parent: Option<TypeId>, is_node_kind: bool) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(TypeNode {
            name: name.to_string(),
            parent,
            is_node_kind,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Register a new subtype under an existing type. Returns the parent's
    /// "is a node" classification for the new type, since every type must
    /// be a node-kind or a link-kind.
    pub fn register_subtype(&mut self, name: &str, parent: TypeId) -> Result<TypeId, String> {
        if self.by_name.contains_key(name) {
            return Err(format!("type '{name}' already registered"));
        }
        let is_node_kind = self.nodes[parent.0 as usize].is_node_kind;
        Ok(self.insert(name, Some(parent), is_node_kind))
    }

    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: TypeId) -> Option<&str> {
        self.nodes.get(id.0 as usize).map(|n| n.name.as_str())
    }

    pub fn is_node_type(&self, id: TypeId) -> bool {
        self.nodes.get(id.0 as usize).map(|n| n.is_node_kind).unwrap_or(false)
    }

    pub fn is_link_type(&self, id: TypeId) -> bool {
        !self.is_node_type(id)
    }

    /// Is `candidate` the same type as, or a descendant of, `ancestor`?
    pub fn is_a(&self, candidate: TypeId, ancestor: TypeId) -> bool {
        let mut cur = Some(candidate);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.nodes.get(id.0 as usize).and_then(|n| n.parent);
        }
        false
    }
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_types_resolve() {
        let h = TypeHierarchy::new();
        assert!(h.id_of(AtomType::CONCEPT_NODE).is_some());
        assert!(h.id_of(AtomType::INHERITANCE_LINK).is_some());
    }

    #[test]
    fn is_a_reflexive_and_transitive() {
        let h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let node = h.id_of(AtomType::NODE).unwrap();
        let atom = h.id_of(AtomType::ATOM).unwrap();
        assert!(h.is_a(concept, concept));
        assert!(h.is_a(concept, node));
        assert!(h.is_a(concept, atom));
        assert!(!h.is_a(node, concept));
    }

    #[test]
    fn node_vs_link_classification() {
        let h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let link = h.id_of(AtomType::INHERITANCE_LINK).unwrap();
        assert!(h.is_node_type(concept));
        assert!(h.is_link_type(link));
    }

    #[test]
    fn register_subtype_inherits_node_kind() {
        let mut h = TypeHierarchy::new();
        let concept = h.id_of(AtomType::CONCEPT_NODE).unwrap();
        let animal = h.register_subtype("AnimalNode", concept).unwrap();
        assert!(h.is_node_type(animal));
        assert!(h.is_a(animal, concept));
    }

    #[test]
    fn register_subtype_rejects_duplicate_name() {
        let mut h = TypeHierarchy::new();
        let node = h.id_of(AtomType::NODE).unwrap();
        assert!(h.register_subtype(AtomType::CONCEPT_NODE, node).is_err());
    }
}
