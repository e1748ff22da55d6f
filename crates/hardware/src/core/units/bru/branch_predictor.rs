//! Branch Predictor Interface.
//!
//! This module defines the `BranchPredictor` trait that every direction
//! predictor implements. Targets of direct branches are computed by fetch;
//! register-indirect targets come from the [`super::btb::Btb`].

/// Direction predictor for conditional branches.
pub trait BranchPredictor {
    /// Predicts whether the conditional branch at `pc` is taken.
    fn predict_branch(&self, pc: u64) -> bool;

    /// Trains the predictor with the resolved direction of the branch at `pc`.
    fn update_branch(&mut self, pc: u64, taken: bool);
}

/// Weakly-taken reset value of a 2-bit saturating counter.
pub(crate) const WEAKLY_TAKEN: u8 = 2;

/// Saturating 2-bit counter step.
#[inline]
pub(crate) const fn train(counter: u8, taken: bool) -> u8 {
    if taken {
        if counter < 3 { counter + 1 } else { 3 }
    } else {
        counter.saturating_sub(1)
    }
}
