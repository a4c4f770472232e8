//! # Truth Values
//!
//! A `TruthValue` is a `(strength, confidence)` pair in `[0, 1]^2`: how
//! strongly a statement holds, and how confident the space is in that
//! estimate. Atoms carry a truth value alongside their (immutable)
//! identity; merging two estimates of the same atom favors whichever is
//! more confident.

use serde::{Deserialize, Serialize};

/// A simple (strength, confidence) truth value.
///
/// Both fields are clamped to `[0.0, 1.0]` at construction so that every
/// live `TruthValue` is valid by construction; there is no invalid state
/// to check for downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    pub strength: f64,
    pub confidence: f64,
}

impl TruthValue {
    /// Absolute truth, fully confident.
    pub const TRUE: TruthValue = TruthValue { strength: 1.0, confidence: 1.0 };
    /// Absolute falsehood, fully confident.
    pub const FALSE: TruthValue = TruthValue { strength: 0.0, confidence: 1.0 };
    /// The default truth value assigned to freshly-created atoms: an even
    /// prior, with zero confidence (nothing is known yet).
    pub const DEFAULT: TruthValue = TruthValue { strength: 0.5, confidence: 0.0 };

    pub fn new(strength: f64, confidence: f64) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.strength) && (0.0..=1.0).contains(&self.confidence)
    }

    /// Merge two estimates of the same atom's truth, weighting by
    /// confidence. A confidence-zero estimate contributes nothing; two
    /// equally confident estimates average their strength and the
    /// resulting confidence rises toward, but never exceeds, 1.0.
    pub fn merge(&self, other: &TruthValue) -> TruthValue {
        let total_confidence = self.confidence + other.confidence;
        if total_confidence <= 0.0 {
            return *self;
        }
        let strength =
            (self.strength * self.confidence + other.strength * other.confidence) / total_confidence;
        let confidence = (self.confidence + other.confidence).min(1.0);
        TruthValue::new(strength, confidence)
    }
}

impl Default for TruthValue {
    fn default() -> Self {
        TruthValue::DEFAULT
    }
}

impl std::fmt::Display for TruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stv {:.2}/{:.2}", self.strength, self.confidence)
    }
}

/// Short/long-term importance, carried alongside the truth value but never
/// read by the matcher or rule engine. See SPEC_FULL.md §2.2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionValue {
    pub sti: f64,
    pub lti: f64,
}

impl AttentionValue {
    pub fn zero() -> Self {
        Self { sti: 0.0, lti: 0.0 }
    }
}

impl Default for AttentionValue {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_inputs() {
        let tv = TruthValue::new(1.5, -0.3);
        assert_eq!(tv.strength, 1.0);
        assert_eq!(tv.confidence, 0.0);
    }

    #[test]
    fn merge_ignores_zero_confidence_other() {
        let a = TruthValue::new(0.8, 0.6);
        let b = TruthValue::new(0.1, 0.0);
        assert_eq!(a.merge(&b), a);
    }

    #[test]
    fn merge_weights_by_confidence() {
        let a = TruthValue::new(1.0, 0.5);
        let b = TruthValue::new(0.0, 0.5);
        let merged = a.merge(&b);
        assert!((merged.strength - 0.5).abs() < 1e-9);
    }

    #[test]
    fn merge_confidence_never_exceeds_one() {
        let a = TruthValue::new(0.9, 1.0);
        let b = TruthValue::new(0.9, 1.0);
        assert!(a.merge(&b).confidence <= 1.0);
    }

    #[test]
    fn display_format() {
        let tv = TruthValue::new(0.5, 0.25);
        assert_eq!(format!("{}", tv), "stv 0.50/0.25");
    }
}
