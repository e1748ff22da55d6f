//! Bimodal Branch Predictor.
//!
//! A table of 2-bit saturating counters indexed by the branch address. Each
//! counter starts weakly taken; a branch is predicted taken when its counter
//! is 2 or 3.

use super::BranchPredictor;
use super::branch_predictor::{WEAKLY_TAKEN, train};

/// Bimodal Predictor structure.
#[derive(Clone, Debug)]
pub struct BimodalPredictor {
    /// Pattern table of 2-bit counters.
    table: Vec<u8>,
}

impl BimodalPredictor {
    /// Creates a predictor with `entries` counters (a power of two).
    pub fn new(entries: usize) -> Self {
        Self {
            table: vec![WEAKLY_TAKEN; entries.max(1)],
        }
    }

    fn index(&self, pc: u64) -> usize {
        ((pc >> 2) as usize) & (self.table.len() - 1)
    }
}

impl BranchPredictor for BimodalPredictor {
    fn predict_branch(&self, pc: u64) -> bool {
        self.table[self.index(pc)] >= 2
    }

    fn update_branch(&mut self, pc: u64, taken: bool) {
        let idx = self.index(pc);
        self.table[idx] = train(self.table[idx], taken);
    }
}
