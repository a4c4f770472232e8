//! # Pattern Matcher (C4)
//!
//! Structural unification of a template atom (whose transitive outgoing
//! set may mention `VARIABLE_NODE` handles, optionally type-restricted)
//! against concrete atoms in an `AtomSpace`. Multi-clause conjunctive
//! queries are evaluated clause-by-clause ordered by selectivity (the
//! clause with the fewest type-indexed candidates runs first, pruning the
//! search as early as possible), and results are ranked by the geometric
//! mean confidence of the atoms each clause actually matched.

use crate::domain::atom::{AtomKind, Handle};
use crate::domain::binding::Bindings;
use crate::domain::store::AtomSpace;

/// One fully-bound result of a conjunctive match: the variable bindings,
/// the concrete atom each clause matched (in clause order as given, not
/// selectivity order), and the result's confidence score.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub bindings: Bindings,
    pub matched: Vec<Handle>,
    pub confidence: f64,
}

pub struct PatternMatcher<'a> {
    space: &'a AtomSpace,
}

struct PartialMatch {
    bindings: Bindings,
    matched: Vec<(usize, Handle)>,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(space: &'a AtomSpace) -> Self {
        Self { space }
    }

    /// Unify `template` (possibly a variable, possibly a structural
    /// pattern) against the concrete atom `candidate`, extending
    /// `bindings`. Returns `None` on any mismatch.
    pub fn unify(&self, template: Handle, candidate: Handle, bindings: &Bindings) -> Option<Bindings> {
        if let Some(restriction) = self.space.variable_restriction(template) {
            if let Some(bound) = bindings.get(template) {
                return if bound == candidate { Some(bindings.clone()) } else { None };
            }
            if let Some(required_type) = restriction {
                let cand_atom = self.space.get(candidate)?;
                if !self.space.type_hierarchy().read().is_a(cand_atom.atom_type, required_type) {
                    return None;
                }
            }
            return bindings.bind(template, candidate);
        }

        let t = self.space.get(template)?;
        let c = self.space.get(candidate)?;
        if t.atom_type != c.atom_type {
            return None;
        }
        match (&t.kind, &c.kind) {
            (AtomKind::Node { name: n1 }, AtomKind::Node { name: n2 }) => {
                if n1 == n2 {
                    Some(bindings.clone())
                } else {
                    None
                }
            }
            (AtomKind::Link { outgoing: o1 }, AtomKind::Link { outgoing: o2 }) => {
                if o1.len() != o2.len() {
                    return None;
                }
                let mut cur = bindings.clone();
                for (tpl_h, cand_h) in o1.iter().zip(o2.iter()) {
                    cur = self.unify(*tpl_h, *cand_h, &cur)?;
                }
                Some(cur)
            }
            _ => None,
        }
    }

    /// Whether `handle` is free of variables anywhere in its transitive
    /// outgoing set — i.e. it names one specific atom rather than a
    /// pattern over many.
    pub fn is_ground(&self, handle: Handle) -> bool {
        !self.contains_variable(handle)
    }

    /// Whether `handle`, or anything in its transitive outgoing set, is a
    /// registered variable (see `AtomSpace::add_variable`).
    fn contains_variable(&self, handle: Handle) -> bool {
        if self.space.variable_restriction(handle).is_some() {
            return true;
        }
        match self.space.get(handle) {
            Some(atom) => atom.outgoing().iter().any(|h| self.contains_variable(*h)),
            None => false,
        }
    }

    /// Candidate handles worth trying for a clause: every atom whose type
    /// is the clause's type or a registered subtype of it (spec §4.2's
    /// `atoms_by_type(type, include_subtypes=true)` contract). This is
    /// the selectivity signal — a clause whose type has few instances
    /// prunes the search far more than one whose type is common.
    fn candidates_for_clause(&self, template: Handle) -> Vec<Handle> {
        match self.space.get(template) {
            Some(atom) => self.space.get_by_type_inclusive(atom.atom_type),
            None => Vec::new(),
        }
    }

    /// Match a conjunction of clause templates against the space,
    /// returning every consistent binding, most-confident first.
    pub fn match_conjunction(&self, clauses: &[Handle]) -> Vec<MatchResult> {
        if clauses.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..clauses.len()).collect();
        let candidate_counts: Vec<usize> = clauses
            .iter()
            .map(|c| self.candidates_for_clause(*c).len())
            .collect();
        order.sort_by_key(|&i| candidate_counts[i]);

        let mut partials = vec![PartialMatch {
            bindings: Bindings::new(),
            matched: Vec::new(),
        }];

        for &clause_idx in &order {
            let clause = clauses[clause_idx];
            let candidates = self.candidates_for_clause(clause);
            let clause_is_ground = !self.contains_variable(clause);
            let mut next = Vec::new();
            for pm in &partials {
                for &cand in &candidates {
                    // A non-ground clause template is itself stored as an
                    // ordinary atom (its variables must live somewhere);
                    // exclude it from its own candidate set so a variable
                    // never binds to part of its own pattern. A ground
                    // clause (no variables anywhere in it) has no such
                    // risk — its only possible match IS itself.
                    if cand == clause && !clause_is_ground {
                        continue;
                    }
                    if let Some(nb) = self.unify(clause, cand, &pm.bindings) {
                        let mut matched = pm.matched.clone();
                        matched.push((clause_idx, cand));
                        next.push(PartialMatch { bindings: nb, matched });
                    }
                }
            }
            partials = next;
            if partials.is_empty() {
                break;
            }
        }

        let mut results: Vec<MatchResult> = partials
            .into_iter()
            .map(|pm| {
                let mut matched = pm.matched;
                matched.sort_by_key(|(idx, _)| *idx);
                let handles: Vec<Handle> = matched.iter().map(|(_, h)| *h).collect();
                let confidence = self.geometric_mean_confidence(&handles);
                MatchResult {
                    bindings: pm.bindings,
                    matched: handles,
                    confidence,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    /// Geometric mean, over every atom matched, of strength×confidence
    /// (spec §4.4: "the geometric-mean of the truth-value strength×
    /// confidence of every atom matched"), floored per-atom so a single
    /// zero-confidence match doesn't collapse the whole product to zero.
    fn geometric_mean_confidence(&self, handles: &[Handle]) -> f64 {
        if handles.is_empty() {
            return 1.0;
        }
        const FLOOR: f64 = 1e-9;
        let product: f64 = handles
            .iter()
            .map(|h| {
                self.space
                    .get(*h)
                    .map(|a| (a.tv.strength * a.tv.confidence).max(FLOOR))
                    .unwrap_or(FLOOR)
            })
            .product();
        product.powf(1.0 / handles.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::truth_value::TruthValue;
    use crate::domain::type_hierarchy::AtomType;

    fn setup() -> (AtomSpace, Handle, Handle, Handle) {
        let s = AtomSpace::new();
        let concept = s.type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap();
        let inh = s.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK).unwrap();
        let dog = s.add_node(concept, "dog", TruthValue::new(1.0, 0.9));
        let animal = s.add_node(concept, "animal", TruthValue::new(1.0, 0.9));
        let link = s.add_link(inh, vec![dog, animal], TruthValue::new(0.9, 0.8)).unwrap();
        (s, dog, animal, link)
    }

    #[test]
    fn unify_ground_atoms_matches_identical_only() {
        let (s, dog, animal, _) = setup();
        let matcher = PatternMatcher::new(&s);
        assert!(matcher.unify(dog, dog, &Bindings::new()).is_some());
        assert!(matcher.unify(dog, animal, &Bindings::new()).is_none());
    }

    #[test]
    fn unify_unrestricted_variable_binds_anything() {
        let (s, dog, _animal, _) = setup();
        let concept = s.type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap();
        let var = s.add_variable(concept, "$x", None);
        let bindings = PatternMatcher::new(&s).unify(var, dog, &Bindings::new()).unwrap();
        assert_eq!(bindings.get(var), Some(dog));
    }

    #[test]
    fn unify_type_restricted_variable_rejects_wrong_type() {
        let (s, dog, _animal, link) = setup();
        let inh = s.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK).unwrap();
        let var = s.add_variable(inh, "$x", Some(inh));
        let matcher = PatternMatcher::new(&s);
        assert!(matcher.unify(var, link, &Bindings::new()).is_some());
        assert!(matcher.unify(var, dog, &Bindings::new()).is_none());
    }

    #[test]
    fn match_conjunction_finds_inheritance_link_via_variable() {
        let (s, dog, animal, link) = setup();
        let concept = s.type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap();
        let inh = s.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK).unwrap();
        let var = s.add_variable(concept, "$x", Some(concept));
        let template = s.add_link(inh, vec![var, animal], TruthValue::DEFAULT).unwrap();
        let results = PatternMatcher::new(&s).match_conjunction(&[template]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].bindings.get(var), Some(dog));
        assert_eq!(results[0].matched, vec![link]);
    }

    #[test]
    fn results_ordered_by_descending_confidence() {
        let s = AtomSpace::new();
        let concept = s.type_hierarchy().read().id_of(AtomType::CONCEPT_NODE).unwrap();
        let inh = s.type_hierarchy().read().id_of(AtomType::INHERITANCE_LINK).unwrap();
        let dog = s.add_node(concept, "dog", TruthValue::DEFAULT);
        let cat = s.add_node(concept, "cat", TruthValue::DEFAULT);
        let animal = s.add_node(concept, "animal", TruthValue::DEFAULT);
        let strong = s.add_link(inh, vec![dog, animal], TruthValue::new(0.9, 0.9)).unwrap();
        let weak = s.add_link(inh, vec![cat, animal], TruthValue::new(0.9, 0.1)).unwrap();
        let var = s.add_variable(concept, "$x", Some(concept));
        let template = s.add_link(inh, vec![var, animal], TruthValue::DEFAULT).unwrap();
        let results = PatternMatcher::new(&s).match_conjunction(&[template]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].matched, vec![strong]);
        assert_eq!(results[1].matched, vec![weak]);
    }
}
