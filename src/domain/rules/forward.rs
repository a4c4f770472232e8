//! # Forward Chainer (spec §4.5.1)
//!
//! Fixpoint saturation: repeatedly apply every registered rule to the
//! whole space, materialize whatever new conclusions they produce, and
//! stop once a pass adds nothing new (or the deadline/step budget cuts it
//! short — spec §5, §7). Rule application within one pass is batched
//! through rayon once there are enough rules to make it worth the
//! overhead, the same threshold-gated pattern as
//! `qc-04::domain::parallel::compute_storage_roots_parallel`.

use rayon::prelude::*;

use crate::domain::atom::Handle;
use crate::domain::rules::combinators::{deduction, inheritance_to_subset, modus_ponens};
use crate::domain::rules::{ChainStatus, Deadline};
use crate::domain::store::AtomSpace;
use crate::domain::truth_value::TruthValue;
use crate::domain::type_hierarchy::{AtomType, TypeId};

/// Below this many rules, sequential iteration beats the overhead of
/// spinning up rayon's thread pool.
pub const PARALLEL_THRESHOLD: usize = 4;

/// One candidate conclusion a rule proposes for this pass.
pub struct Conclusion {
    pub atom_type: TypeId,
    pub outgoing: Vec<Handle>,
    pub tv: TruthValue,
}

/// A rule the forward chainer applies every pass.
pub trait ForwardRule: Send + Sync {
    fn name(&self) -> &str;

    /// Scan the space for conclusions this rule can currently derive.
    /// Implementations should be cheap to call every pass; the chainer
    /// itself handles dedup against what already exists.
    fn apply(&self, space: &AtomSpace) -> Vec<Conclusion>;
}

#[derive(Debug, Clone)]
pub struct ForwardChainResult {
    pub new_atoms: Vec<Handle>,
    pub status: ChainStatus,
    pub steps: u64,
}

pub struct ForwardChainer<'a> {
    space: &'a AtomSpace,
}

impl<'a> ForwardChainer<'a> {
    pub fn new(space: &'a AtomSpace) -> Self {
        Self { space }
    }

    /// Run every rule to fixpoint. `new_atoms` accumulates every handle
    /// actually newly materialized across the whole run (per-run dedup:
    /// a conclusion that already existed before this run, or that a rule
    /// proposes again on a later pass, is merged but not counted twice).
    pub fn run(&self, rules: &[Box<dyn ForwardRule + 'a>], deadline: Deadline) -> ForwardChainResult {
        let mut new_atoms = Vec::new();
        let mut steps = 0u64;

        loop {
            if deadline.is_expired() {
                return ForwardChainResult { new_atoms, status: ChainStatus::Timeout, steps };
            }
            if deadline.steps_exhausted(steps) {
                return ForwardChainResult { new_atoms, status: ChainStatus::Exhausted, steps };
            }
            steps += 1;

            let conclusions: Vec<Conclusion> = if rules.len() >= PARALLEL_THRESHOLD {
                rules.par_iter().flat_map(|r| r.apply(self.space)).collect()
            } else {
                rules.iter().flat_map(|r| r.apply(self.space)).collect()
            };

            let mut progress = false;
            for conclusion in conclusions {
                let already_existed = self
                    .space
                    .find_link(conclusion.atom_type, &conclusion.outgoing)
                    .is_some();
                if let Ok(handle) = self.space.add_link(conclusion.atom_type, conclusion.outgoing, conclusion.tv) {
                    if !already_existed {
                        new_atoms.push(handle);
                        progress = true;
                    }
                }
            }

            if !progress {
                return ForwardChainResult { new_atoms, status: ChainStatus::Completed, steps };
            }
        }
    }
}

/// Built-in rule: saturate `InheritanceLink` transitivity — from
/// `A -> B` and `B -> C` already in the space, derive `A -> C` via
/// deduction. O(n^2) over the current inheritance links, acceptable at
/// the scale this crate targets (spec's non-goal on ML-scale training
/// data applies here too).
pub struct InheritanceClosureRule;

impl ForwardRule for InheritanceClosureRule {
    fn name(&self) -> &str {
        "inheritance-closure"
    }

    fn apply(&self, space: &AtomSpace) -> Vec<Conclusion> {
        let Some(inh_t) = space.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK) else {
            return Vec::new();
        };
        let links = space.get_by_type(inh_t);
        let mut conclusions = Vec::new();

        for &l1 in &links {
            let Some(a1) = space.get(l1) else { continue };
            if a1.outgoing().len() != 2 {
                continue;
            }
            let (x, y) = (a1.outgoing()[0], a1.outgoing()[1]);
            for &l2 in &links {
                let Some(a2) = space.get(l2) else { continue };
                if a2.outgoing().len() != 2 {
                    continue;
                }
                let (y2, z) = (a2.outgoing()[0], a2.outgoing()[1]);
                if y2 != y || x == z {
                    continue;
                }
                if space.find_link(inh_t, &[x, z]).is_some() {
                    continue;
                }
                let c_prior = space.get(z).map(|a| a.tv).unwrap_or(TruthValue::DEFAULT);
                conclusions.push(Conclusion {
                    atom_type: inh_t,
                    outgoing: vec![x, z],
                    tv: deduction(a1.tv, a2.tv, c_prior),
                });
            }
        }
        conclusions
    }
}

/// Built-in rule: every `InheritanceLink(A, B)` licenses a weaker
/// extensional `SubsetLink(A, B)` (spec §4.5.4's inheritance-to-subset
/// combinator).
pub struct InheritanceToSubsetRule;

impl ForwardRule for InheritanceToSubsetRule {
    fn name(&self) -> &str {
        "inheritance-to-subset"
    }

    fn apply(&self, space: &AtomSpace) -> Vec<Conclusion> {
        let Some(inh_t) = space.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK) else {
            return Vec::new();
        };
        let Some(subset_t) = space.type_hierarchy().read().id_of(AtomType::SUBSET_LINK) else {
            return Vec::new();
        };
        space
            .get_by_type(inh_t)
            .into_iter()
            .filter_map(|link| {
                let atom = space.get(link)?;
                if atom.outgoing().len() != 2 {
                    return None;
                }
                if space.find_link(subset_t, &atom.outgoing().to_vec()).is_some() {
                    return None;
                }
                Some(Conclusion {
                    atom_type: subset_t,
                    outgoing: atom.outgoing().to_vec(),
                    tv: inheritance_to_subset(atom.tv),
                })
            })
            .collect()
    }
}

/// Built-in rule: modus ponens over propositions. An `InheritanceLink`
/// whose two endpoints are both `EvaluationLink`s reads as "antecedent
/// implies consequent"; once the antecedent holds (positive confidence),
/// derive the consequent's truth value and merge it back in under its
/// own identity (so `add_link`'s canonicalizing merge updates it rather
/// than inserting a duplicate).
pub struct ModusPonensRule;

impl ForwardRule for ModusPonensRule {
    fn name(&self) -> &str {
        "modus-ponens"
    }

    fn apply(&self, space: &AtomSpace) -> Vec<Conclusion> {
        let Some(inh_t) = space.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK) else {
            return Vec::new();
        };
        let Some(eval_t) = space.type_hierarchy().read().id_of(AtomType::EVALUATION_LINK) else {
            return Vec::new();
        };
        let mut conclusions = Vec::new();
        for link in space.get_by_type(inh_t) {
            let Some(implication) = space.get(link) else { continue };
            if implication.outgoing().len() != 2 {
                continue;
            }
            let (antecedent, consequent) = (implication.outgoing()[0], implication.outgoing()[1]);
            let (Some(a), Some(c)) = (space.get(antecedent), space.get(consequent)) else {
                continue;
            };
            if a.atom_type != eval_t || c.atom_type != eval_t || a.tv.confidence <= 0.0 {
                continue;
            }
            // Consequent already has a derived truth value from a prior
            // pass; re-deriving it every pass would double-count the same
            // evidence through `merge`'s additive confidence.
            if c.tv.confidence > 0.0 {
                continue;
            }
            conclusions.push(Conclusion {
                atom_type: c.atom_type,
                outgoing: c.outgoing().to_vec(),
                tv: modus_ponens(a.tv, implication.tv),
            });
        }
        conclusions
    }
}
