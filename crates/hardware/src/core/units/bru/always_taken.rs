//! Static Branch Predictor.
//!
//! Predicts every conditional branch taken and keeps no state.

use super::BranchPredictor;

/// Always-taken predictor.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysTakenPredictor;

impl BranchPredictor for AlwaysTakenPredictor {
    fn predict_branch(&self, _pc: u64) -> bool {
        true
    }

    fn update_branch(&mut self, _pc: u64, _taken: bool) {}
}
