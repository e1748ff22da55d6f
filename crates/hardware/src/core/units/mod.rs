//! Execution units and functional components.
//!
//! This module contains the functional units (ALU, FPU, LSU) behind a common
//! countdown model, the branch prediction unit used by fetch, and the data
//! cache consulted by the load/store unit.
//!
//! A [`FunctionalUnit`] accepts one instruction at a time. `execute` computes
//! the value immediately and arms a countdown of `latency(opcode)` cycles
//! (plus any memory penalty); `update` is called once per cycle and hands the
//! instruction back exactly once, on the cycle the countdown reaches zero.

/// Arithmetic Logic Unit for integer operations, branches and jumps.
pub mod alu;

/// Branch prediction unit: direction predictors and BTB.
pub mod bru;

/// Set-associative data cache with LRU replacement.
pub mod cache;

/// Floating-Point Unit for double-precision arithmetic.
pub mod fpu;

/// Load/Store Unit for memory access operations.
pub mod lsu;

use std::collections::BTreeMap;

use serde::Serialize;

use self::alu::Alu;
use self::fpu::Fpu;
use self::lsu::Lsu;
use crate::common::error::{ExecutionError, Rejected};
use crate::common::reg::RegisterFile;
use crate::isa::instruction::{InstId, Instruction, Status};
use crate::isa::opcode::{Opcode, UnitKind};
use crate::soc::traits::DataPort;

/// Per-unit counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UnitStats {
    /// Instructions accepted.
    pub executed: u64,
    /// Cycles spent holding an instruction.
    pub busy_cycles: u64,
    /// Instructions rejected with an execution error.
    pub errors: u64,
    /// In-flight instructions discarded by a flush.
    pub squashed: u64,
}

#[derive(Clone, Debug)]
struct InFlight {
    instruction: Instruction,
    value: u64,
    remaining: u32,
}

/// One functional unit instance (`ALU0`, `FPU1`, `LSU0`, ...).
#[derive(Clone, Debug)]
pub struct FunctionalUnit {
    name: String,
    kind: UnitKind,
    latencies: BTreeMap<Opcode, u32>,
    in_flight: Option<InFlight>,
    stats: UnitStats,
}

impl FunctionalUnit {
    /// Creates unit `index` of class `kind` with per-opcode latency overrides.
    pub fn new(kind: UnitKind, index: usize, latencies: BTreeMap<Opcode, u32>) -> Self {
        Self {
            name: format!("{}{index}", kind.name()),
            kind,
            latencies,
            in_flight: None,
            stats: UnitStats::default(),
        }
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit class.
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Counters.
    pub const fn stats(&self) -> &UnitStats {
        &self.stats
    }

    /// Returns true while an instruction is in flight.
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The instruction in flight.
    pub fn current(&self) -> Option<&Instruction> {
        self.in_flight.as_ref().map(|f| &f.instruction)
    }

    /// Cycles left before the in-flight instruction completes; 0 when idle.
    pub fn remaining_cycles(&self) -> u32 {
        self.in_flight.as_ref().map_or(0, |f| f.remaining)
    }

    /// Returns true if this unit class executes `op`.
    pub fn supports(&self, op: Opcode) -> bool {
        op.unit() == self.kind
    }

    /// Latency of `op` on this unit: the configured override or the opcode
    /// table value, never less than one cycle.
    pub fn latency(&self, op: Opcode) -> u32 {
        self.latencies
            .get(&op)
            .copied()
            .unwrap_or_else(|| op.latency())
            .max(1)
    }

    /// Starts `inst`. On success the computed value is returned and the unit
    /// stays busy for `latency(opcode)` cycles plus any memory penalty.
    ///
    /// # Errors
    ///
    /// Hands the instruction back with [`ExecutionError::UnitBusy`] if the
    /// unit is occupied, [`ExecutionError::UnsupportedOpcode`] for a foreign
    /// opcode, or the error raised by the operation itself. A rejected
    /// instruction leaves the unit idle.
    pub fn execute(
        &mut self,
        mut inst: Instruction,
        regs: &RegisterFile,
        port: &mut dyn DataPort,
    ) -> Result<u64, Rejected<ExecutionError>> {
        if self.is_busy() {
            return Err(Rejected::new(
                inst,
                ExecutionError::UnitBusy {
                    unit: self.name.clone(),
                },
            ));
        }
        let opcode = inst.opcode;
        if !self.supports(opcode) {
            self.stats.errors += 1;
            return Err(Rejected::new(
                inst,
                ExecutionError::UnsupportedOpcode {
                    unit: self.kind,
                    opcode,
                },
            ));
        }

        let computed = match self.kind {
            UnitKind::Alu => Alu::execute(&mut inst, regs).map(|v| (v, 0, Status::Executing)),
            UnitKind::Fpu => Fpu::execute(&inst, regs).map(|v| (v, 0, Status::Executing)),
            UnitKind::Lsu => {
                Lsu::execute(&inst, regs, port).map(|a| (a.value, a.penalty, Status::MemoryAccess))
            }
        };
        let (value, penalty, status) = match computed {
            Ok(done) => done,
            Err(error) => {
                self.stats.errors += 1;
                inst.unit = Some(self.name.clone());
                return Err(Rejected::new(inst, error));
            }
        };

        let remaining = self.latency(inst.opcode).saturating_add(penalty);
        inst.status = status;
        inst.unit = Some(self.name.clone());
        inst.result = Some(value);
        tracing::debug!(
            unit = %self.name,
            id = %inst.id,
            inst = %inst,
            value,
            cycles = remaining,
            "execute"
        );
        self.stats.executed += 1;
        self.in_flight = Some(InFlight {
            instruction: inst,
            value,
            remaining,
        });
        Ok(value)
    }

    /// Advances one cycle. Returns the instruction and its value on the cycle
    /// its countdown reaches zero, after which the unit is idle.
    pub fn update(&mut self) -> Option<(Instruction, u64)> {
        let flight = self.in_flight.as_mut()?;
        self.stats.busy_cycles += 1;
        flight.remaining = flight.remaining.saturating_sub(1);
        if flight.remaining > 0 {
            return None;
        }
        let done = self.in_flight.take()?;
        Some((done.instruction, done.value))
    }

    /// Discards the in-flight instruction if it is younger than `id`.
    /// Returns true if something was discarded.
    pub fn squash_younger(&mut self, id: InstId) -> bool {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.instruction.id > id)
        {
            self.squash();
            true
        } else {
            false
        }
    }

    /// Discards the in-flight instruction.
    pub fn squash(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            self.stats.squashed += 1;
            tracing::debug!(unit = %self.name, id = %flight.instruction.id, "squash");
        }
    }
}
