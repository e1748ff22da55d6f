//! Instruction and configuration builders.

use sspsim_core::config::{Config, PredictorKind};
use sspsim_core::isa::{InstId, Instruction, Status};

/// Parses `text` as instruction `id` at address `4 * id`.
pub fn inst(id: u64, text: &str) -> Instruction {
    Instruction::from_asm(InstId(id), 4 * id, text).unwrap()
}

/// Like [`inst`], already through decode.
pub fn decoded(id: u64, text: &str) -> Instruction {
    let mut inst = inst(id, text);
    inst.status = Status::Decoded;
    inst
}

/// Sets `result` the way a functional unit would.
pub fn produced(id: u64, text: &str, result: u64) -> Instruction {
    let mut inst = inst(id, text);
    inst.result = Some(result);
    inst
}

/// Fluent construction of a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue_width(mut self, width: usize) -> Self {
        self.config.pipeline.issue_width = width;
        self.config.pipeline.fetch_width = width;
        self.config.pipeline.commit_width = width;
        self
    }

    pub fn rob_size(mut self, size: usize) -> Self {
        self.config.pipeline.rob_size = size;
        self
    }

    pub fn rs_size(mut self, size: usize) -> Self {
        self.config.pipeline.rs_size = size;
        self
    }

    pub fn alus(mut self, count: usize) -> Self {
        self.config.units.alu.count = count;
        self
    }

    pub fn latency(mut self, mnemonic: &str, cycles: u32) -> Self {
        let _ = self
            .config
            .units
            .latencies
            .insert(mnemonic.to_string(), cycles);
        self
    }

    pub fn predictor(mut self, kind: PredictorKind) -> Self {
        self.config.branch_predictor.kind = kind;
        self
    }

    pub fn forwarding(mut self, enabled: bool) -> Self {
        self.config.forwarding.enabled = enabled;
        self
    }

    pub fn max_cycles(mut self, cycles: u64) -> Self {
        self.config.general.max_cycles = cycles;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
