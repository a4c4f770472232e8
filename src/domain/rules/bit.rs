//! # Backward Inference Tree (spec §4.5.2)
//!
//! A `Bit` is the search tree a `BackwardChainer` expands: each node
//! targets an atom to prove, and (once a rule is chosen for it) has one
//! child per premise that rule needs proven first. A node is `Expanded`
//! once its target is known true (directly matched, or all its premise
//! children expanded and combined), `Exhausted` once no rule and no
//! direct match can prove it, and `Unexpanded` otherwise.

use crate::domain::atom::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    Unexpanded,
    Expanded,
    Exhausted,
}

pub type BitNodeId = usize;

#[derive(Debug)]
pub struct BitNode {
    pub target: Handle,
    pub fitness: f64,
    pub parent: Option<BitNodeId>,
    pub children: Vec<BitNodeId>,
    pub state: ExpansionState,
    pub rule_name: Option<String>,
}

/// The tree itself, stored as a flat arena so node ids stay stable across
/// mutation (matches the `qc-02` convention of arena-style index
/// structures over pointer graphs).
#[derive(Debug)]
pub struct Bit {
    nodes: Vec<BitNode>,
    root: BitNodeId,
}

impl Bit {
    pub fn new(target: Handle, fitness: f64) -> Self {
        Self {
            nodes: vec![BitNode {
                target,
                fitness,
                parent: None,
                children: Vec::new(),
                state: ExpansionState::Unexpanded,
                rule_name: None,
            }],
            root: 0,
        }
    }

    pub fn root(&self) -> BitNodeId {
        self.root
    }

    pub fn node(&self, id: BitNodeId) -> &BitNode {
        &self.nodes[id]
    }

    pub fn add_child(&mut self, parent: BitNodeId, target: Handle, fitness: f64) -> BitNodeId {
        let id = self.nodes.len();
        self.nodes.push(BitNode {
            target,
            fitness,
            parent: Some(parent),
            children: Vec::new(),
            state: ExpansionState::Unexpanded,
            rule_name: None,
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn set_rule(&mut self, id: BitNodeId, name: &str) {
        self.nodes[id].rule_name = Some(name.to_string());
    }

    pub fn mark_expanded(&mut self, id: BitNodeId) {
        self.nodes[id].state = ExpansionState::Expanded;
    }

    pub fn mark_exhausted(&mut self, id: BitNodeId) {
        self.nodes[id].state = ExpansionState::Exhausted;
    }

    /// The highest-fitness node that is still unexpanded and has no
    /// children yet (a leaf awaiting its first expansion attempt).
    pub fn best_unexpanded_leaf(&self) -> Option<BitNodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.state == ExpansionState::Unexpanded && n.children.is_empty())
            .max_by(|(_, a), (_, b)| a.fitness.partial_cmp(&b.fitness).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
