//! Branch prediction unit (BRU) implementations.
//!
//! This module contains the direction predictors (always-taken, bimodal,
//! gshare), the branch target buffer (BTB) for register-indirect jumps, and
//! [`BranchUnit`], which combines them into the next-address prediction used
//! by fetch and the training hook called at commit.

pub use self::branch_predictor::BranchPredictor;

/// Branch predictor trait and common functionality.
pub mod branch_predictor;

/// Static predictor (always taken).
pub mod always_taken;

/// Per-address 2-bit counter predictor.
pub mod bimodal;

/// Branch Target Buffer for register-indirect jump targets.
pub mod btb;

/// Global history branch predictor (gshare algorithm).
pub mod gshare;

use serde::Serialize;

use self::{
    always_taken::AlwaysTakenPredictor, bimodal::BimodalPredictor, btb::Btb,
    gshare::GSharePredictor,
};
use crate::config::{BranchPredictorConfig, PredictorKind};
use crate::isa::instruction::Instruction;
use crate::isa::opcode::Format;

/// Enum wrapper for static dispatch of Branch Predictors.
/// This avoids vtable lookups in the critical fetch loop.
#[derive(Clone, Debug)]
pub enum BranchPredictorWrapper {
    /// Always taken.
    AlwaysTaken(AlwaysTakenPredictor),
    /// Bimodal.
    Bimodal(BimodalPredictor),
    /// Gshare.
    GShare(GSharePredictor),
}

impl BranchPredictorWrapper {
    /// Creates the predictor selected by `config`.
    pub fn new(config: &BranchPredictorConfig) -> Self {
        match config.kind {
            PredictorKind::AlwaysTaken => Self::AlwaysTaken(AlwaysTakenPredictor),
            PredictorKind::Bimodal => Self::Bimodal(BimodalPredictor::new(config.num_entries)),
            PredictorKind::Gshare => Self::GShare(GSharePredictor::new(
                config.num_entries,
                config.history_length,
            )),
        }
    }
}

impl BranchPredictor for BranchPredictorWrapper {
    #[inline]
    fn predict_branch(&self, pc: u64) -> bool {
        match self {
            Self::AlwaysTaken(bp) => bp.predict_branch(pc),
            Self::Bimodal(bp) => bp.predict_branch(pc),
            Self::GShare(bp) => bp.predict_branch(pc),
        }
    }

    #[inline]
    fn update_branch(&mut self, pc: u64, taken: bool) {
        match self {
            Self::AlwaysTaken(bp) => bp.update_branch(pc, taken),
            Self::Bimodal(bp) => bp.update_branch(pc, taken),
            Self::GShare(bp) => bp.update_branch(pc, taken),
        }
    }
}

/// Prediction counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BranchStats {
    /// Conditional-branch predictions made at fetch.
    pub predictions: u64,
    /// Conditional branches committed.
    pub committed: u64,
    /// Committed conditional branches whose predicted path was right.
    pub correct: u64,
    /// Committed control-flow instructions whose predicted path was wrong.
    pub mispredictions: u64,
    /// Register-indirect jumps whose target was found in the BTB.
    pub btb_hits: u64,
}

impl BranchStats {
    /// Fraction of committed conditional branches predicted correctly.
    pub fn accuracy(&self) -> f64 {
        if self.committed == 0 {
            0.0
        } else {
            self.correct as f64 / self.committed as f64
        }
    }
}

/// Direction predictor, BTB and counters.
#[derive(Clone, Debug)]
pub struct BranchUnit {
    predictor: BranchPredictorWrapper,
    btb: Btb,
    stats: BranchStats,
}

impl BranchUnit {
    /// Builds the unit described by `config`.
    pub fn new(config: &BranchPredictorConfig) -> Self {
        Self {
            predictor: BranchPredictorWrapper::new(config),
            btb: Btb::new(config.btb_size),
            stats: BranchStats::default(),
        }
    }

    /// Counters.
    pub const fn stats(&self) -> &BranchStats {
        &self.stats
    }

    /// Predicted target of `inst` when control is expected to leave the
    /// fall-through path; `None` means fall through.
    ///
    /// Conditional branches consult the direction predictor, `J`/`JAL` use
    /// their encoded target and `JR`/`JALR` use the BTB.
    pub fn predict(&mut self, inst: &Instruction) -> Option<u64> {
        match inst.opcode.format() {
            Format::Branch => {
                self.stats.predictions += 1;
                if self.predictor.predict_branch(inst.pc) {
                    inst.static_target()
                } else {
                    None
                }
            }
            Format::Jump => inst.static_target(),
            Format::JumpRegister => {
                let target = self.btb.lookup(inst.pc);
                if target.is_some() {
                    self.stats.btb_hits += 1;
                }
                target
            }
            _ => None,
        }
    }

    /// Trains on a committed control-flow instruction whose resolved
    /// direction was `taken`.
    pub fn update(&mut self, inst: &Instruction, taken: bool) {
        let mispredicted = inst.mispredicted();
        if mispredicted {
            self.stats.mispredictions += 1;
        }
        match inst.opcode.format() {
            Format::Branch => {
                self.predictor.update_branch(inst.pc, taken);
                self.stats.committed += 1;
                if !mispredicted {
                    self.stats.correct += 1;
                }
            }
            Format::JumpRegister => {
                if let Some(outcome) = inst.outcome {
                    self.btb.update(inst.pc, outcome.target);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::instruction::{BranchOutcome, InstId};

    fn inst(pc: u64, text: &str) -> Instruction {
        Instruction::from_asm(InstId(pc / 4), pc, text).unwrap()
    }

    fn config(kind: PredictorKind) -> BranchPredictorConfig {
        BranchPredictorConfig {
            kind,
            ..BranchPredictorConfig::default()
        }
    }

    #[test]
    fn test_always_taken_uses_static_target() {
        let mut bru = BranchUnit::new(&config(PredictorKind::AlwaysTaken));
        let beq = inst(0x10, "BEQ $t0, $t1, 3");
        assert_eq!(bru.predict(&beq), Some(0x10 + 4 + 12));
        assert_eq!(bru.predict(&inst(0x14, "J 0x40")), Some(0x40));
        assert_eq!(bru.predict(&inst(0x18, "ADD $t0, $t1, $t2")), None);
    }

    #[test]
    fn test_indirect_jump_learns_target() {
        let mut bru = BranchUnit::new(&config(PredictorKind::Gshare));
        let mut jr = inst(0x20, "JR $ra");
        assert_eq!(bru.predict(&jr), None);
        jr.outcome = Some(BranchOutcome {
            taken: true,
            target: 0x80,
            next_pc: 0x80,
        });
        bru.update(&jr, true);
        assert_eq!(bru.predict(&jr), Some(0x80));
        assert_eq!(bru.stats().btb_hits, 1);
        assert_eq!(bru.stats().mispredictions, 1);
    }

    #[test]
    fn test_accuracy_counts_committed_branches() {
        let mut bru = BranchUnit::new(&config(PredictorKind::Bimodal));
        let mut bne = inst(0x8, "BNE $t0, $t1, 1");
        bne.predicted_next = bru.predict(&bne).or(Some(bne.fallthrough()));
        bne.outcome = Some(BranchOutcome {
            taken: false,
            target: 0x10,
            next_pc: 0xC,
        });
        bru.update(&bne, false);
        assert_eq!(bru.stats().committed, 1);
        assert_eq!(bru.stats().correct, 0);
        assert!((bru.stats().accuracy() - 0.0).abs() < f64::EPSILON);
    }
}
