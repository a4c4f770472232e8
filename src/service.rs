//! # Composition Root
//!
//! `AtomSpaceService` wires a bare `AtomSpace` to the built-in rule sets
//! and exposes it behind `AtomSpaceApi`, the same role
//! `qc-02::service::BlockStorageService` plays for its subsystem: own the
//! domain object, attach whatever outbound adapters the embedding host
//! provides, and implement the inbound trait in terms of both.

use crate::domain::atom::Handle;
use crate::domain::errors::AtomSpaceError;
use crate::domain::matcher::{MatchResult, PatternMatcher};
use crate::domain::query::{Query, QueryTranslator};
use crate::domain::rules::backward::{BackwardChainer, BackwardRule, ChainResult, InversionRule, TransitiveInheritanceRule};
use crate::domain::rules::forward::{
    ForwardChainResult, ForwardChainer, ForwardRule, InheritanceClosureRule, InheritanceToSubsetRule, ModusPonensRule,
};
use crate::domain::rules::Deadline;
use crate::domain::store::{AtomSpace, StoreConfig, StoreStats};
use crate::domain::truth_value::TruthValue;
use crate::ports::api::AtomSpaceApi;
use crate::ports::storage::StorageNode;

/// Owns an `AtomSpace` and the default rule sets used to answer queries,
/// forward-saturate, and backward-prove against it.
pub struct AtomSpaceService {
    space: AtomSpace,
}

impl AtomSpaceService {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self { space: AtomSpace::with_config(config) }
    }

    /// Direct access to the underlying store for operations outside the
    /// `AtomSpaceApi` surface (e.g. `add_node`/`add_link`).
    pub fn space(&self) -> &AtomSpace {
        &self.space
    }

    pub fn attach_backend(&self, node: Box<dyn StorageNode>) {
        self.space.attach_backend(node);
    }

    /// `InversionRule` is listed after `TransitiveInheritanceRule` so it's
    /// only tried once deduction has no bridging concept to chain through.
    fn backward_rules(&self) -> Vec<Box<dyn BackwardRule>> {
        vec![Box::new(TransitiveInheritanceRule), Box::new(InversionRule)]
    }

    fn forward_rules(&self) -> Vec<Box<dyn ForwardRule>> {
        vec![
            Box::new(InheritanceClosureRule),
            Box::new(InheritanceToSubsetRule),
            Box::new(ModusPonensRule),
        ]
    }
}

impl Default for AtomSpaceService {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomSpaceApi for AtomSpaceService {
    fn query(&self, query: &Query) -> Result<(Vec<Handle>, Vec<MatchResult>), AtomSpaceError> {
        let translator = QueryTranslator::new(&self.space);
        let (templates, select) = translator.translate(query)?;
        let matcher = PatternMatcher::new(&self.space);
        Ok((select, matcher.match_conjunction(&templates)))
    }

    fn prove(&self, goal: Handle, deadline: Deadline) -> ChainResult {
        let chainer = BackwardChainer::new(&self.space, self.backward_rules());
        chainer.prove(goal, deadline)
    }

    fn saturate(&self, deadline: Deadline) -> ForwardChainResult {
        let chainer = ForwardChainer::new(&self.space);
        chainer.run(&self.forward_rules(), deadline)
    }

    fn set_truth_value(&self, handle: Handle, tv: TruthValue) -> Result<(), AtomSpaceError> {
        self.space.set_truth_value(handle, tv)
    }

    fn remove(&self, handle: Handle) -> Result<Vec<Handle>, AtomSpaceError> {
        self.space.remove(handle)
    }

    fn flush(&self) -> Result<(), AtomSpaceError> {
        self.space.flush()
    }

    fn stats(&self) -> StoreStats {
        self.space.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::memory::InMemoryStorageNode;
    use crate::domain::query::{Clause, Term};
    use crate::domain::type_hierarchy::AtomType;

    #[test]
    fn query_finds_inheritance_match() {
        let service = AtomSpaceService::new();
        let concept = service.space().type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap();
        let inh = service.space().type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK).unwrap();
        let dog = service.space().add_node(concept, "dog", TruthValue::new(1.0, 0.9));
        service.space().add_node(concept, "animal", TruthValue::new(1.0, 0.9));
        service.space().add_link(inh, vec![dog, service.space().find_node(concept, "animal").unwrap()], TruthValue::new(0.9, 0.8)).unwrap();

        let query = Query {
            select: vec!["$x".to_string()],
            clauses: vec![Clause::Isa {
                child: Term::Var { name: "$x".to_string(), restriction: Some(AtomType::CONCEPT_NODE.to_string()) },
                parent: Term::Name("animal".to_string()),
            }],
        };
        let (select, results) = service.query(&query).unwrap();
        assert_eq!(select.len(), 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].bindings.get(select[0]), Some(dog));
    }

    #[test]
    fn saturate_runs_builtin_forward_rule() {
        let service = AtomSpaceService::new();
        let concept = service.space().type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap();
        let inh = service.space().type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK).unwrap();
        let dog = service.space().add_node(concept, "dog", TruthValue::DEFAULT);
        let mammal = service.space().add_node(concept, "mammal", TruthValue::DEFAULT);
        let animal = service.space().add_node(concept, "animal", TruthValue::DEFAULT);
        service.space().add_link(inh, vec![dog, mammal], TruthValue::new(0.9, 0.9)).unwrap();
        service.space().add_link(inh, vec![mammal, animal], TruthValue::new(0.9, 0.9)).unwrap();

        let result = service.saturate(Deadline::unbounded().with_max_steps(10));
        assert!(service.space().find_link(inh, &[dog, animal]).is_some());
        assert!(!result.new_atoms.is_empty());
    }

    #[test]
    fn flush_writes_through_to_attached_backend() {
        let service = AtomSpaceService::new();
        service.attach_backend(Box::new(InMemoryStorageNode::new()));
        // InMemoryStorageNode starts disconnected; flush against a
        // disconnected-only backend set reports StorageUnavailable.
        let concept = service.space().type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap();
        service.space().add_node(concept, "dog", TruthValue::DEFAULT);
        assert!(service.flush().is_err());
    }
}
