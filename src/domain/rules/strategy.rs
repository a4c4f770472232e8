//! # Chaining Strategy (spec §4.5.3)
//!
//! Which direction(s) to run inference in for a given goal. `ADAPTIVE`
//! does not consult any global state — each `AdaptiveSelector` instance
//! keeps its own rolling-average score per goal shape, scoped to
//! whichever chainer owns it (spec §9 rules out global mutable state).

use std::collections::{HashMap, HashSet};

use crate::domain::atom::Handle;
use crate::domain::store::AtomSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    ForwardOnly,
    BackwardOnly,
    MixedForwardFirst,
    MixedBackwardFirst,
    AdaptiveBidirectional,
}

/// Coarse shape of a goal, used as the key into the adaptive selector's
/// history table (spec §4.5.3's `(target-type, depth, variable-count)`
/// descriptor): goals of the same type, recursion depth, and variable
/// count tend to respond similarly to a given strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GoalShape {
    pub atom_type: u32,
    pub arity: usize,
    pub depth: u32,
    pub variable_count: usize,
}

impl GoalShape {
    /// `depth` is the goal's position in the BIT being expanded (0 at the
    /// root), supplied by the caller since a bare `Handle` carries no
    /// notion of recursion depth on its own.
    pub fn of(space: &AtomSpace, goal: Handle, depth: u32) -> Option<Self> {
        let atom = space.get(goal)?;
        let mut seen = HashSet::new();
        Some(Self {
            atom_type: atom.atom_type.0,
            arity: atom.outgoing().len(),
            depth,
            variable_count: count_variables(space, goal, &mut seen),
        })
    }
}

/// Count distinct variable handles anywhere in `handle`'s transitive
/// outgoing set, including `handle` itself.
fn count_variables(space: &AtomSpace, handle: Handle, seen: &mut HashSet<Handle>) -> usize {
    if !seen.insert(handle) {
        return 0;
    }
    let mut count = usize::from(space.variable_restriction(handle).is_some());
    if let Some(atom) = space.get(handle) {
        for child in atom.outgoing() {
            count += count_variables(space, *child, seen);
        }
    }
    count
}

/// Exponential moving average weight applied when folding in a new
/// observed score for a (shape, strategy) pair.
const EMA_ALPHA: f64 = 0.3;

#[derive(Debug, Default)]
struct ScoreEntry {
    average: f64,
    observations: u64,
}

/// Per-chainer history of how well each concrete strategy (everything
/// but `AdaptiveBidirectional` itself) has performed on each goal shape
/// seen so far. `record` folds in a new outcome; `choose` picks the
/// best-scoring strategy for a shape, falling back to
/// `MixedForwardFirst` for shapes it has never seen.
#[derive(Debug, Default)]
pub struct AdaptiveSelector {
    history: HashMap<(GoalShape, Strategy), ScoreEntry>,
}

/// Candidates tried against `MixedForwardFirst`, the tie-break default
/// (spec §4.5.3: "breaking ties by forward-first").
const OTHER_CANDIDATES: [Strategy; 3] =
    [Strategy::ForwardOnly, Strategy::BackwardOnly, Strategy::MixedBackwardFirst];

impl AdaptiveSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the historically best strategy for this goal shape. A
    /// `score` is proportional to "goal proven, cheaply" — callers
    /// decide the exact scoring function when they call `record`. Ties
    /// (including an unseen shape, where every score defaults to 0.0)
    /// resolve to `MixedForwardFirst`.
    pub fn choose(&self, shape: &GoalShape) -> Strategy {
        let score_of = |s: Strategy| self.history.get(&(shape.clone(), s)).map(|e| e.average).unwrap_or(0.0);
        let mut best = Strategy::MixedForwardFirst;
        let mut best_score = score_of(best);
        for candidate in OTHER_CANDIDATES {
            let score = score_of(candidate);
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        best
    }

    pub fn record(&mut self, shape: GoalShape, strategy: Strategy, score: f64) {
        let entry = self.history.entry((shape, strategy)).or_default();
        entry.average = if entry.observations == 0 {
            score
        } else {
            EMA_ALPHA * score + (1.0 - EMA_ALPHA) * entry.average
        };
        entry.observations += 1;
    }

    pub fn observations_for(&self, shape: &GoalShape, strategy: Strategy) -> u64 {
        self.history.get(&(shape.clone(), strategy)).map(|e| e.observations).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(atom_type: u32, arity: usize) -> GoalShape {
        GoalShape { atom_type, arity, depth: 0, variable_count: 0 }
    }

    #[test]
    fn unseen_shape_falls_back_to_mixed_forward_first() {
        let selector = AdaptiveSelector::new();
        assert_eq!(selector.choose(&shape(1, 2)), Strategy::MixedForwardFirst);
    }

    #[test]
    fn distinct_depth_or_variable_count_is_a_distinct_shape() {
        let a = GoalShape { atom_type: 1, arity: 2, depth: 0, variable_count: 0 };
        let b = GoalShape { atom_type: 1, arity: 2, depth: 1, variable_count: 0 };
        let c = GoalShape { atom_type: 1, arity: 2, depth: 0, variable_count: 1 };
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn records_and_prefers_higher_scoring_strategy() {
        let mut selector = AdaptiveSelector::new();
        let s = shape(1, 2);
        selector.record(s.clone(), Strategy::ForwardOnly, 0.2);
        selector.record(s.clone(), Strategy::BackwardOnly, 0.9);
        assert_eq!(selector.choose(&s), Strategy::BackwardOnly);
    }

    #[test]
    fn ema_smooths_repeated_observations() {
        let mut selector = AdaptiveSelector::new();
        let s = shape(2, 2);
        selector.record(s.clone(), Strategy::ForwardOnly, 1.0);
        selector.record(s.clone(), Strategy::ForwardOnly, 0.0);
        assert_eq!(selector.observations_for(&s, Strategy::ForwardOnly), 2);
        let avg = selector.history.get(&(s, Strategy::ForwardOnly)).unwrap().average;
        assert!(avg > 0.0 && avg < 1.0);
    }

    #[test]
    fn history_is_scoped_per_shape() {
        let mut selector = AdaptiveSelector::new();
        selector.record(shape(1, 2), Strategy::BackwardOnly, 0.9);
        assert_eq!(selector.choose(&shape(9, 9)), Strategy::MixedForwardFirst);
    }
}
