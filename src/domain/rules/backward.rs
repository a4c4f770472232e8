//! # Backward Chainer (spec §4.5.2)
//!
//! Goal-directed inference: given a target atom (typically a link
//! template, possibly with variables), try to prove it directly via the
//! pattern matcher; if that fails, expand a `Bit` by asking each
//! registered `BackwardRule` whether it can reduce the goal to premises,
//! recursing into those premises, and combining their truth values back
//! up once all of a node's premises are proven. Timeouts and step-budget
//! exhaustion are normal terminations: whatever direct matches exist for
//! the goal at that point are returned alongside the status (spec §7).

use crate::domain::atom::Handle;
use crate::domain::binding::Bindings;
use crate::domain::matcher::{MatchResult, PatternMatcher};
use crate::domain::rules::bit::{Bit, BitNodeId, ExpansionState};
use crate::domain::rules::Deadline;
use crate::domain::store::AtomSpace;
use crate::domain::truth_value::TruthValue;
use crate::domain::type_hierarchy::TypeId;
use crate::domain::rules::ChainStatus;

/// A rule the backward chainer can use to reduce a goal to premises.
pub trait BackwardRule: Send + Sync {
    fn name(&self) -> &str;

    /// If this rule can address `goal`, return the premise handles that
    /// must be proven for it to apply. A premise need not already hold —
    /// `propose_premises` may materialize a *virtual* premise (inserted
    /// with `TruthValue::DEFAULT`, i.e. unproven) for the chainer to
    /// recurse into. Returning `None` means "this rule does not apply to
    /// this goal shape" (not "premises can't be proven" — that's
    /// discovered by recursing into them).
    fn propose_premises(&self, space: &AtomSpace, goal: Handle) -> Option<Vec<Handle>>;

    /// Combine the (now-proven) premises' truth values and materialize
    /// the goal's truth value in the space. Takes `space` and `goal`
    /// alongside the premises' truth values because some combinators
    /// (deduction's `c_prior`, inversion's base rate) need a node's own
    /// prior truth value, which isn't one of the BIT's premises.
    fn combine(&self, space: &AtomSpace, goal: Handle, premise_tvs: &[TruthValue]) -> TruthValue;
}

/// Find an existing link matching `(atom_type, outgoing)`, or insert it as
/// a virtual, unproven premise (`TruthValue::DEFAULT`) for the chainer to
/// recurse into. The outgoing handles are always already present in
/// `space` (they come from an existing goal's own outgoing set), so the
/// closure invariant can't fail here.
fn get_or_create_premise(space: &AtomSpace, atom_type: TypeId, outgoing: Vec<Handle>) -> Handle {
    space.find_link(atom_type, &outgoing).unwrap_or_else(|| {
        space
            .add_link(atom_type, outgoing, TruthValue::DEFAULT)
            .expect("outgoing atoms of an existing goal are already in this space")
    })
}

/// Fitness of a BIT node: weighted toward targets that are both
/// structurally simple (few outgoing handles to chain through) and
/// already partially trusted (positive existing confidence suggests a
/// nearby proof rather than a cold start) — spec §4.5.2's "structural
/// complexity of the target" and "current truth-value confidence of
/// matching atoms".
fn fitness_of(space: &AtomSpace, target: Handle) -> f64 {
    let Some(atom) = space.get(target) else { return 0.0 };
    let complexity_penalty = 1.0 + atom.outgoing().len() as f64;
    (atom.tv.confidence.max(0.05)) / complexity_penalty
}

/// Whether `target` counts as proven: for a ground atom (no variables
/// anywhere in it), that means its own truth value carries positive
/// confidence (a freshly-inserted, not-yet-derived goal starts at zero
/// confidence precisely so it reads as unproven); for a pattern
/// containing variables, that means the matcher finds at least one
/// consistent binding against the rest of the space.
fn direct_proof(space: &AtomSpace, matcher: &PatternMatcher, target: Handle) -> Vec<MatchResult> {
    if matcher.is_ground(target) {
        match space.get(target) {
            Some(atom) if atom.tv.confidence > 0.0 => vec![MatchResult {
                bindings: Bindings::new(),
                matched: vec![target],
                confidence: atom.tv.confidence,
            }],
            _ => Vec::new(),
        }
    } else {
        matcher.match_conjunction(&[target])
    }
}

/// The outcome of a `BackwardChainer::prove` call.
#[derive(Debug, Clone)]
pub struct ChainResult {
    pub results: Vec<MatchResult>,
    pub status: ChainStatus,
    pub steps: u64,
}

pub struct BackwardChainer<'a> {
    space: &'a AtomSpace,
    rules: Vec<Box<dyn BackwardRule + 'a>>,
}

impl<'a> BackwardChainer<'a> {
    pub fn new(space: &'a AtomSpace, rules: Vec<Box<dyn BackwardRule + 'a>>) -> Self {
        Self { space, rules }
    }

    /// Attempt to prove `goal`, expanding the Backward Inference Tree
    /// until it resolves, or until `deadline` cuts the search short.
    pub fn prove(&self, goal: Handle, deadline: Deadline) -> ChainResult {
        let matcher = PatternMatcher::new(self.space);
        let mut bit = Bit::new(goal, fitness_of(self.space, goal));
        let mut steps = 0u64;

        loop {
            match bit.node(bit.root()).state {
                ExpansionState::Expanded => {
                    return ChainResult {
                        results: direct_proof(self.space, &matcher, goal),
                        status: ChainStatus::Completed,
                        steps,
                    };
                }
                ExpansionState::Exhausted => {
                    return ChainResult {
                        results: direct_proof(self.space, &matcher, goal),
                        status: ChainStatus::Exhausted,
                        steps,
                    };
                }
                ExpansionState::Unexpanded => {}
            }

            if deadline.is_expired() {
                return ChainResult {
                    results: direct_proof(self.space, &matcher, goal),
                    status: ChainStatus::Timeout,
                    steps,
                };
            }
            if deadline.steps_exhausted(steps) {
                return ChainResult {
                    results: direct_proof(self.space, &matcher, goal),
                    status: ChainStatus::Exhausted,
                    steps,
                };
            }

            let Some(node_id) = bit.best_unexpanded_leaf() else {
                return ChainResult {
                    results: direct_proof(self.space, &matcher, goal),
                    status: ChainStatus::Exhausted,
                    steps,
                };
            };
            steps += 1;
            self.expand(&mut bit, node_id, &matcher);
        }
    }

    fn expand(&self, bit: &mut Bit, node_id: BitNodeId, matcher: &PatternMatcher) {
        let target = bit.node(node_id).target;

        if !direct_proof(self.space, matcher, target).is_empty() {
            bit.mark_expanded(node_id);
            self.propagate(bit, node_id);
            return;
        }

        for rule in &self.rules {
            if let Some(premises) = rule.propose_premises(self.space, target) {
                bit.set_rule(node_id, rule.name());
                for premise in premises {
                    let fitness = fitness_of(self.space, premise);
                    bit.add_child(node_id, premise, fitness);
                }
                return;
            }
        }

        bit.mark_exhausted(node_id);
        self.propagate(bit, node_id);
    }

    fn propagate(&self, bit: &mut Bit, node_id: BitNodeId) {
        let Some(parent_id) = bit.node(node_id).parent else {
            return;
        };
        let children = bit.node(parent_id).children.clone();

        if children.iter().all(|c| bit.node(*c).state == ExpansionState::Expanded) {
            if let Some(rule_name) = bit.node(parent_id).rule_name.clone() {
                if let Some(rule) = self.rules.iter().find(|r| r.name() == rule_name) {
                    let tvs: Vec<TruthValue> = children
                        .iter()
                        .filter_map(|c| self.space.get(bit.node(*c).target).map(|a| a.tv))
                        .collect();
                    let tv = rule.combine(self.space, bit.node(parent_id).target, &tvs);
                    if let Some(atom) = self.space.get(bit.node(parent_id).target) {
                        if atom.is_link() {
                            let _ = self.space.add_link(atom.atom_type, atom.outgoing().to_vec(), tv);
                        }
                    }
                }
            }
            bit.mark_expanded(parent_id);
            self.propagate(bit, parent_id);
        } else if children.iter().any(|c| bit.node(*c).state == ExpansionState::Exhausted) {
            bit.mark_exhausted(parent_id);
            self.propagate(bit, parent_id);
        }
    }
}

/// Built-in rule: `InheritanceLink(A, C)` can be proven via some
/// intermediate concept `B`, recursing into `InheritanceLink(A, B)` and
/// `InheritanceLink(B, C)` as premises (creating them as virtual,
/// unproven atoms if they don't already exist — spec §4.5.2's premises
/// as "targets to be discharged") and combining the results by
/// deduction. Grounded on spec.md §4.5.4's deduction formula.
pub struct TransitiveInheritanceRule;

impl TransitiveInheritanceRule {
    /// The first concept other than `child`/`parent` worth trying as a
    /// bridge. Candidates already linked on both legs are tried first
    /// implicitly (since `get_by_type_inclusive`'s order isn't otherwise
    /// meaningful, any candidate does); picking a concrete candidate at
    /// all is what lets the chainer recurse into sub-goals that aren't
    /// materialized yet.
    fn pick_bridge(space: &AtomSpace, concept_t: TypeId, child: Handle, parent: Handle) -> Option<Handle> {
        space
            .get_by_type_inclusive(concept_t)
            .into_iter()
            .find(|&candidate| candidate != child && candidate != parent)
    }
}

impl BackwardRule for TransitiveInheritanceRule {
    fn name(&self) -> &str {
        "transitive-inheritance"
    }

    fn propose_premises(&self, space: &AtomSpace, goal: Handle) -> Option<Vec<Handle>> {
        use crate::domain::type_hierarchy::AtomType;

        let atom = space.get(goal)?;
        let hierarchy = space.type_hierarchy();
        let inh_t = hierarchy.read().id_of(AtomType::INHERITANCE_LINK)?;
        let concept_t = hierarchy.read().id_of(AtomType::CONCEPT_NODE)?;
        if atom.atom_type != inh_t || atom.outgoing().len() != 2 {
            return None;
        }
        let child = atom.outgoing()[0];
        let parent = atom.outgoing()[1];

        let candidate = Self::pick_bridge(space, concept_t, child, parent)?;
        let left = get_or_create_premise(space, inh_t, vec![child, candidate]);
        let right = get_or_create_premise(space, inh_t, vec![candidate, parent]);
        Some(vec![left, right])
    }

    fn combine(&self, space: &AtomSpace, goal: Handle, premise_tvs: &[TruthValue]) -> TruthValue {
        use crate::domain::rules::combinators::deduction;
        let c_prior = space
            .get(goal)
            .and_then(|atom| atom.outgoing().get(1).copied())
            .and_then(|parent| space.get(parent))
            .map(|parent| parent.tv)
            .unwrap_or(TruthValue::DEFAULT);
        match premise_tvs {
            [a, b] => deduction(*a, *b, c_prior),
            _ => TruthValue::DEFAULT,
        }
    }
}

/// Built-in rule: when no bridging concept lets `TransitiveInheritanceRule`
/// apply, fall back to proving the reverse link `InheritanceLink(B, A)`
/// and inverting it (spec §4.5.4's inversion combinator). Registered
/// after `TransitiveInheritanceRule` in `service.rs` so it's only reached
/// once the deduction path has nothing to bridge through.
pub struct InversionRule;

impl BackwardRule for InversionRule {
    fn name(&self) -> &str {
        "inversion"
    }

    fn propose_premises(&self, space: &AtomSpace, goal: Handle) -> Option<Vec<Handle>> {
        use crate::domain::type_hierarchy::AtomType;

        let atom = space.get(goal)?;
        let inh_t = space.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK)?;
        if atom.atom_type != inh_t || atom.outgoing().len() != 2 {
            return None;
        }
        let (child, parent) = (atom.outgoing()[0], atom.outgoing()[1]);
        let reverse = get_or_create_premise(space, inh_t, vec![parent, child]);
        Some(vec![reverse])
    }

    fn combine(&self, space: &AtomSpace, goal: Handle, premise_tvs: &[TruthValue]) -> TruthValue {
        use crate::domain::rules::combinators::inversion;
        // `reverse` is `parent -> child` (the premise's own "A -> B"); its
        // base rate is `parent`'s own prior, i.e. `goal`'s parent (index 1).
        let base_rate_a = space
            .get(goal)
            .and_then(|atom| atom.outgoing().get(1).copied())
            .and_then(|parent| space.get(parent))
            .map(|parent| parent.tv);
        match premise_tvs {
            [reverse] => inversion(*reverse, base_rate_a),
            _ => TruthValue::DEFAULT,
        }
    }
}
