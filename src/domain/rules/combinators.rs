//! # Rule Combinators (spec §4.5.4)
//!
//! The minimal formula set the forward and backward chainers compose
//! rules out of.

use crate::domain::truth_value::TruthValue;

/// Confidence discount applied by every combinator below.
pub const DISCOUNT: f64 = 0.9;

/// Deduction: from `A -> B` (strength/confidence `s1`/`c1`), `B -> C`
/// (`s2`/`c2`), and `C`'s own prior truth value (`s3`/`c3`, used as a
/// stand-in for `P(C|¬B)`), derive `A -> C`:
/// `s = s1·s2 + (1−s1)·(s3−s2·s3)/(1−s2)`, guarded against `s2 = 1`;
/// `c = min(c1, c2, c3)·discount`.
pub fn deduction(a_to_b: TruthValue, b_to_c: TruthValue, c_prior: TruthValue) -> TruthValue {
    let (s1, s2, s3) = (a_to_b.strength, b_to_c.strength, c_prior.strength);
    let strength = if (1.0 - s2).abs() < 1e-9 {
        s1 * s2
    } else {
        s1 * s2 + (1.0 - s1) * (s3 - s2 * s3) / (1.0 - s2)
    };
    let confidence = a_to_b.confidence.min(b_to_c.confidence).min(c_prior.confidence) * DISCOUNT;
    TruthValue::new(strength, confidence)
}

/// Inversion: from `A -> B`, derive `B -> A` via a Bayes-style update
/// using `A`'s own base rate when available, else the default base rate
/// of 0.5: `s' = s·base_rate_a / (s·base_rate_a + (1−s)·(1−base_rate_a))`,
/// guarded against a degenerate all-zero denominator.
pub fn inversion(a_to_b: TruthValue, base_rate_a: Option<TruthValue>) -> TruthValue {
    let ra = base_rate_a.map(|tv| tv.strength).unwrap_or(0.5);
    let numerator = a_to_b.strength * ra;
    let denominator = numerator + (1.0 - a_to_b.strength) * (1.0 - ra);
    let strength = if denominator.abs() < 1e-9 { ra } else { numerator / denominator };
    let confidence = a_to_b.confidence * DISCOUNT;
    TruthValue::new(strength, confidence)
}

/// Modus ponens: from `A` holding and `A -> B`, derive `B`.
pub fn modus_ponens(a: TruthValue, a_to_b: TruthValue) -> TruthValue {
    let strength = a.strength * a_to_b.strength;
    let confidence = a.confidence.min(a_to_b.confidence) * DISCOUNT;
    TruthValue::new(strength, confidence)
}

/// Inheritance-to-subset: an `InheritanceLink(A, B)` licenses a weaker,
/// purely extensional `SubsetLink(A, B)` fact — strength carries over
/// unchanged, confidence is discounted since the subset reading is a
/// derived, not directly observed, claim.
pub fn inheritance_to_subset(inheritance: TruthValue) -> TruthValue {
    TruthValue::new(inheritance.strength, inheritance.confidence * DISCOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduction_discounts_confidence_by_weakest_premise() {
        let ab = TruthValue::new(0.9, 0.9);
        let bc = TruthValue::new(0.9, 0.6);
        let c_prior = TruthValue::new(0.5, 0.9);
        let result = deduction(ab, bc, c_prior);
        assert!((result.confidence - 0.6 * DISCOUNT).abs() < 1e-9);
    }

    #[test]
    fn deduction_strength_blends_transitivity_and_prior() {
        let ab = TruthValue::new(0.9, 0.9);
        let bc = TruthValue::new(0.8, 0.9);
        let c_prior = TruthValue::new(0.5, 0.9);
        let result = deduction(ab, bc, c_prior);
        // s = 0.9*0.8 + (1-0.9)*(0.5 - 0.8*0.5)/(1-0.8) = 0.72 + 0.1*(0.1/0.2) = 0.72+0.05
        assert!((result.strength - 0.77).abs() < 1e-9);
    }

    #[test]
    fn deduction_guards_against_s2_equal_one() {
        let ab = TruthValue::new(0.9, 0.9);
        let bc = TruthValue::new(1.0, 0.9);
        let c_prior = TruthValue::new(0.3, 0.9);
        let result = deduction(ab, bc, c_prior);
        assert!((result.strength - 0.9).abs() < 1e-9);
    }

    #[test]
    fn modus_ponens_bounds_confidence_by_weakest_premise() {
        let a = TruthValue::new(1.0, 0.3);
        let a_to_b = TruthValue::new(1.0, 0.95);
        let result = modus_ponens(a, a_to_b);
        assert!(result.confidence <= 0.3);
    }

    #[test]
    fn inversion_falls_back_to_default_base_rate() {
        let ab = TruthValue::new(0.8, 0.8);
        let ba = inversion(ab, None);
        assert!(ba.confidence < ab.confidence);
        assert!(ba.strength > 0.0 && ba.strength < 1.0);
    }

    #[test]
    fn inheritance_to_subset_preserves_strength_and_discounts_confidence() {
        let inh = TruthValue::new(0.7, 0.8);
        let subset = inheritance_to_subset(inh);
        assert_eq!(subset.strength, inh.strength);
        assert!((subset.confidence - 0.8 * DISCOUNT).abs() < 1e-9);
    }
}
