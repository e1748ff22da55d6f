//! GShare Branch Predictor.
//!
//! GShare correlates global branch history with the program counter using an XOR
//! hash. This allows the predictor to distinguish the same branch instruction
//! in different execution contexts.
//!
//! # Performance
//!
//! - **Time Complexity:** O(1) for both `predict_branch()` and `update_branch()`
//! - **Space Complexity:** one 2-bit counter per table entry
//! - **Best Case:** Correlated branches where outcome depends on recent history
//! - **Worst Case:** Uncorrelated branches or history length too short/long for pattern

use super::BranchPredictor;
use super::branch_predictor::{WEAKLY_TAKEN, train};

/// GShare Predictor structure.
#[derive(Clone, Debug)]
pub struct GSharePredictor {
    /// Global History Register storing recent branch outcomes.
    ghr: u64,
    /// Mask keeping `history_length` bits of the GHR.
    history_mask: u64,
    /// Pattern History Table containing 2-bit saturating counters.
    pht: Vec<u8>,
}

impl GSharePredictor {
    /// Creates a predictor with `entries` counters and `history_length`
    /// bits of global history.
    pub fn new(entries: usize, history_length: usize) -> Self {
        Self {
            ghr: 0,
            history_mask: (1u64 << history_length.min(63)) - 1,
            pht: vec![WEAKLY_TAKEN; entries.max(1)],
        }
    }

    /// Current global history.
    pub const fn history(&self) -> u64 {
        self.ghr
    }

    /// Calculates the index into the Pattern History Table.
    ///
    /// Computes the XOR of the PC (shifted) and the Global History Register.
    fn index(&self, pc: u64) -> usize {
        let mask = (self.pht.len() - 1) as u64;
        (((pc >> 2) ^ self.ghr) & mask) as usize
    }
}

impl BranchPredictor for GSharePredictor {
    /// Returns true if the 2-bit counter at the hashed index is 2 or 3.
    fn predict_branch(&self, pc: u64) -> bool {
        self.pht[self.index(pc)] >= 2
    }

    /// Updates the counter at the hashed index and shifts the outcome into
    /// the Global History Register.
    fn update_branch(&mut self, pc: u64, taken: bool) {
        let idx = self.index(pc);
        self.pht[idx] = train(self.pht[idx], taken);
        self.ghr = ((self.ghr << 1) | u64::from(taken)) & self.history_mask;
    }
}
