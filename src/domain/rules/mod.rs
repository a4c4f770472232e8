//! # Rule Engine (C5)
//!
//! Forward chaining (fixpoint saturation over the whole space), backward
//! chaining (goal-directed search via a Backward Inference Tree), the
//! minimal rule-combinator set they're both built from, and the adaptive
//! strategy selector that picks between them. Every long-running
//! operation here takes a `Deadline` and returns a partial-result status
//! rather than panicking on timeout or exhaustion (spec §5, §7).

pub mod backward;
pub mod bit;
pub mod combinators;
pub mod forward;
pub mod strategy;

use std::time::{Duration, Instant};

/// A deadline and step budget shared by the forward and backward
/// chainers. `None` on either field means "unbounded" on that axis.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub expires_at: Option<Instant>,
    pub max_steps: Option<u64>,
}

impl Deadline {
    pub fn unbounded() -> Self {
        Self { expires_at: None, max_steps: None }
    }

    pub fn after(duration: Duration) -> Self {
        Self { expires_at: Some(Instant::now() + duration), max_steps: None }
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|t| Instant::now() >= t).unwrap_or(false)
    }

    pub fn steps_exhausted(&self, steps_taken: u64) -> bool {
        self.max_steps.map(|m| steps_taken >= m).unwrap_or(false)
    }
}

/// How a chaining operation ended. `Completed` means it reached a genuine
/// fixpoint/goal; `Timeout` and `Exhausted` are normal terminations that
/// still carry whatever partial results were found (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    Completed,
    Timeout,
    Exhausted,
}
