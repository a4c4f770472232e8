//! Integration tests exercising the store, matcher, and rule engine
//! together, end to end, the way a caller embedding this crate would.

use std::time::Duration;

use atomspace_core::domain::rules::backward::{BackwardChainer, TransitiveInheritanceRule};
use atomspace_core::domain::rules::bit::ExpansionState;
use atomspace_core::domain::type_hierarchy::AtomType;
use atomspace_core::{AtomSpace, ChainStatus, Deadline, TruthValue};

fn concept_type(space: &AtomSpace) -> atomspace_core::TypeId {
    space.type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap()
}

fn inheritance_type(space: &AtomSpace) -> atomspace_core::TypeId {
    space.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK).unwrap()
}

#[test]
fn inheritance_chain_proves_transitively_with_expected_confidence() {
    let space = AtomSpace::new();
    let concept = concept_type(&space);
    let inh = inheritance_type(&space);

    let dog = space.add_node(concept, "dog", TruthValue::DEFAULT);
    let mammal = space.add_node(concept, "mammal", TruthValue::DEFAULT);
    // `animal`'s own prior feeds deduction's `c_prior` term directly; a
    // zero-confidence default prior would zero out the whole derivation.
    let animal = space.add_node(concept, "animal", TruthValue::new(0.95, 0.95));
    space.add_link(inh, vec![dog, mammal], TruthValue::new(0.9, 0.9)).unwrap();
    space.add_link(inh, vec![mammal, animal], TruthValue::new(0.85, 0.9)).unwrap();

    // The goal link doesn't exist yet; its placeholder starts at zero
    // confidence, which is what marks it "unproven" to the chainer.
    let goal = space.add_link(inh, vec![dog, animal], TruthValue::new(1.0, 0.0)).unwrap();

    let chainer = BackwardChainer::new(&space, vec![Box::new(TransitiveInheritanceRule)]);
    let result = chainer.prove(goal, Deadline::unbounded().with_max_steps(1000));

    assert_eq!(result.status, ChainStatus::Completed);
    let proven = space.get(goal).unwrap();
    // s = s1*s2 + (1-s1)*(s3-s2*s3)/(1-s2), c = min(c1,c2,c3)*0.9
    // s1=0.9,s2=0.85,s3=0.95 -> s=0.86; c1=0.9,c2=0.9,c3=0.95 -> c=0.81
    assert!((proven.tv.strength - 0.86).abs() < 1e-9);
    assert!((proven.tv.confidence - 0.81).abs() < 1e-9);
}

#[test]
fn canonicalisation_does_not_duplicate_an_existing_node() {
    let space = AtomSpace::new();
    let concept = concept_type(&space);
    let a = space.add_node(concept, "x", TruthValue::DEFAULT);
    let b = space.add_node(concept, "x", TruthValue::new(0.5, 0.5));
    assert_eq!(a, b);
    assert_eq!(space.len(), 1);
}

#[test]
fn cascade_delete_leaves_only_the_unreferenced_atom() {
    let space = AtomSpace::new();
    let concept = concept_type(&space);
    let inh = inheritance_type(&space);
    let a = space.add_node(concept, "a", TruthValue::DEFAULT);
    let b = space.add_node(concept, "b", TruthValue::DEFAULT);
    space.add_link(inh, vec![a, b], TruthValue::DEFAULT).unwrap();

    space.remove(a).unwrap();
    assert_eq!(space.len(), 1);
    assert!(space.contains(b));
}

#[test]
fn matcher_ranks_higher_confidence_match_first() {
    use atomspace_core::PatternMatcher;

    let space = AtomSpace::new();
    let concept = concept_type(&space);
    let inh = inheritance_type(&space);
    let dog = space.add_node(concept, "dog", TruthValue::DEFAULT);
    let cat = space.add_node(concept, "cat", TruthValue::DEFAULT);
    let animal = space.add_node(concept, "animal", TruthValue::DEFAULT);
    let strong = space.add_link(inh, vec![dog, animal], TruthValue::new(0.9, 0.9)).unwrap();
    let weak = space.add_link(inh, vec![cat, animal], TruthValue::new(0.6, 0.3)).unwrap();
    let var = space.add_variable(concept, "$x", Some(concept));
    let template = space.add_link(inh, vec![var, animal], TruthValue::DEFAULT).unwrap();

    let results = PatternMatcher::new(&space).match_conjunction(&[template]);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].matched, vec![strong]);
    assert_eq!(results[1].matched, vec![weak]);
}

#[test]
fn backward_chainer_times_out_on_an_unreachable_goal_without_panicking() {
    let space = AtomSpace::new();
    let concept = concept_type(&space);
    let inh = inheritance_type(&space);

    // Build a long chain of concepts with no direct link from the first
    // to the last, forcing the chainer to search many candidate
    // intermediates before giving up within an effectively-zero deadline.
    let mut prev = space.add_node(concept, "c0", TruthValue::DEFAULT);
    for i in 1..50 {
        let next = space.add_node(concept, format!("c{i}"), TruthValue::DEFAULT);
        space.add_link(inh, vec![prev, next], TruthValue::new(0.9, 0.9)).unwrap();
        prev = next;
    }
    let start = space.find_node(concept, "c0").unwrap();
    let unrelated = space.add_node(concept, "unrelated", TruthValue::DEFAULT);
    let goal = space.add_link(inh, vec![start, unrelated], TruthValue::new(1.0, 0.0)).unwrap();

    let chainer = BackwardChainer::new(&space, vec![Box::new(TransitiveInheritanceRule)]);
    let result = chainer.prove(goal, Deadline::after(Duration::from_nanos(1)));

    assert!(matches!(result.status, ChainStatus::Timeout | ChainStatus::Exhausted));
}

#[test]
fn persistence_round_trip_preserves_identity_and_truth_values() {
    use atomspace_core::adapters::storage::memory::InMemoryStorageNode;
    use atomspace_core::ports::storage::{to_record, StorageNode};

    let space = AtomSpace::new();
    let concept = concept_type(&space);
    let inh = inheritance_type(&space);
    let mut handles = Vec::new();
    for i in 0..50 {
        handles.push(space.add_node(concept, format!("n{i}"), TruthValue::new(0.5, 0.5)));
    }
    for pair in handles.windows(2) {
        space.add_link(inh, vec![pair[0], pair[1]], TruthValue::new(0.42, 0.77)).unwrap();
    }

    // Build the full record set exactly as `AtomSpace::flush` would, and
    // drive a standalone backend through store_graph/load_graph directly
    // so we can inspect what comes back out.
    let records: Vec<_> = (0..space.len() as u64 + 1)
        .filter_map(|h| space.get(atomspace_core::Handle(h)))
        .map(|atom| to_record(&atom, space.type_hierarchy().read().name_of(atom.atom_type).unwrap()))
        .collect();
    assert_eq!(records.len(), space.len());

    let mut backend = InMemoryStorageNode::new();
    backend.open().unwrap();
    backend.store_graph(&records).unwrap();
    let mut loaded = backend.load_graph().unwrap();
    loaded.sort_by_key(|r| r.handle);

    let mut expected = records.clone();
    expected.sort_by_key(|r| r.handle);
    assert_eq!(loaded, expected);

    for record in &loaded {
        if record.type_name == "InheritanceLink" {
            assert_eq!(record.strength, 0.42);
            assert_eq!(record.confidence, 0.77);
        }
    }
}

#[test]
fn bit_node_marks_exhausted_when_no_rule_applies() {
    let space = AtomSpace::new();
    let concept = concept_type(&space);
    let a = space.add_node(concept, "a", TruthValue::DEFAULT);
    let b = space.add_node(concept, "b", TruthValue::DEFAULT);
    let inh = inheritance_type(&space);
    let goal = space.add_link(inh, vec![a, b], TruthValue::new(1.0, 0.0)).unwrap();

    let chainer = BackwardChainer::new(&space, vec![]);
    let result = chainer.prove(goal, Deadline::unbounded().with_max_steps(10));
    assert_eq!(result.status, ChainStatus::Exhausted);
    assert!(result.results.is_empty());
    // sanity: ExpansionState is reachable from the integration surface
    let _ = ExpansionState::Exhausted;
}
