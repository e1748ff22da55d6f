//! Per-cycle orchestration of the out-of-order core.
//!
//! [`Engine`] owns every scheduling structure (reservation stations,
//! scoreboard, forwarding network, reorder buffer, functional units, memory
//! system, branch unit) and the architectural register file. One call to
//! [`Engine::tick`] simulates one cycle, running the stages in reverse
//! pipeline order so each stage sees the state left by the previous cycle:
//!
//! 1. **Commit:** retire ready ROB entries in order; report faults.
//! 2. **Complete:** collect unit results; broadcast; recover from mispredictions.
//! 3. **Dispatch:** start ready reservation-station entries on free units.
//! 4. **Issue:** move decoded instructions from the fetch queue into the core.
//! 5. **Boundary:** clear per-cycle bypass values and count down unit timers.
//!
//! The stage bodies live in [`super::stages`].

use std::collections::VecDeque;

use crate::common::error::ConfigError;
use crate::common::reg::RegisterFile;
use crate::config::Config;
use crate::core::pipeline::forwarding::ForwardingUnit;
use crate::core::pipeline::reservation::{OperandSource, Provenance, ReservationStations};
use crate::core::pipeline::rob::ReorderBuffer;
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::units::FunctionalUnit;
use crate::core::units::bru::BranchUnit;
use crate::isa::abi::Reg;
use crate::isa::instruction::{InstId, Instruction};
use crate::isa::opcode::UnitKind;
use crate::soc::system::MemorySystem;
use crate::stats::{CoreStats, FailedInstruction};

/// What one cycle produced for the front end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Instructions retired this cycle.
    pub retired: usize,
    /// New fetch address after a recovery; the fetch queue has been emptied.
    pub redirect: Option<u64>,
}

/// The out-of-order execution core.
#[derive(Debug)]
pub struct Engine {
    pub(super) regs: RegisterFile,
    pub(super) rs: ReservationStations,
    pub(super) scoreboard: Scoreboard,
    pub(super) forwarding: ForwardingUnit,
    pub(super) rob: ReorderBuffer,
    pub(super) units: Vec<FunctionalUnit>,
    pub(super) memory: MemorySystem,
    pub(super) branch: BranchUnit,
    pub(super) stats: CoreStats,
    pub(super) failed: Vec<FailedInstruction>,
    /// Instructions that left a reservation station but found no idle unit.
    pub(super) deferred: VecDeque<Instruction>,
    /// Instruction whose WAW stall is already counted in the scoreboard.
    pub(super) waw_noted: Option<InstId>,
    pub(super) issue_width: usize,
    pub(super) commit_width: usize,
    pub(super) trace_commits: bool,
    pub(super) cycle: u64,
}

impl Engine {
    /// Builds the core described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a latency override names an
    /// unknown opcode.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let overrides = config.units.latency_overrides()?;
        let mut scoreboard = Scoreboard::new();
        let mut units = Vec::new();
        for kind in UnitKind::ALL {
            for index in 0..config.units.count(kind) {
                let unit = FunctionalUnit::new(kind, index, overrides.clone());
                scoreboard.register_function_unit(unit.name(), kind);
                units.push(unit);
            }
        }

        tracing::info!(
            rob = config.pipeline.rob_size,
            rs = config.pipeline.rs_size,
            units = units.len(),
            issue_width = config.pipeline.issue_width,
            "engine created"
        );
        Ok(Self {
            regs: RegisterFile::new(),
            rs: ReservationStations::new(config.pipeline.rs_size),
            scoreboard,
            forwarding: ForwardingUnit::from_config(&config.forwarding),
            rob: ReorderBuffer::new(config.pipeline.rob_size),
            units,
            memory: MemorySystem::new(config),
            branch: BranchUnit::new(&config.branch_predictor),
            stats: CoreStats::default(),
            failed: Vec::new(),
            deferred: VecDeque::new(),
            waw_noted: None,
            issue_width: config.pipeline.issue_width,
            commit_width: config.pipeline.commit_width,
            trace_commits: config.general.trace_instructions,
            cycle: 0,
        })
    }

    /// Simulates one cycle.
    ///
    /// Instructions are issued from the front of `queue`. On a recovery the
    /// queue is emptied and the outcome carries the address to fetch from.
    pub fn tick(&mut self, queue: &mut VecDeque<Instruction>) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        self.commit_stage(queue, &mut outcome);
        self.complete_stage(queue, &mut outcome);
        self.dispatch_stage();
        self.issue_stage(queue);
        self.end_cycle();
        outcome
    }

    fn end_cycle(&mut self) {
        self.forwarding.clear_cycle_data();
        self.scoreboard.update_cycle();
        self.rs.end_cycle();
        let occupied = self.rob.len();
        self.stats.rob_occupancy_sum += occupied as u64;
        self.stats.rob_peak = self.stats.rob_peak.max(occupied);
        self.stats.cycles += 1;
        tracing::trace!(
            cycle = self.cycle,
            rob = occupied,
            rs = self.rs.len(),
            busy_units = self.units.iter().filter(|u| u.is_busy()).count(),
            "cycle end"
        );
        self.cycle += 1;
    }

    /// Discards every instruction younger than `keep` from the ROB,
    /// reservation stations, deferred dispatch, functional units, store
    /// buffer and fetch queue, then rebuilds scoreboard ownership from the
    /// survivors.
    pub(super) fn recover(&mut self, keep: InstId, queue: &mut VecDeque<Instruction>) {
        let flushed = self.rob.flush_after(keep);
        let dropped = self.rs.flush_younger(keep);
        self.deferred.retain(|i| i.id <= keep);
        self.waw_noted = None;
        for unit in &mut self.units {
            if unit.squash_younger(keep) {
                self.scoreboard.deallocate_function_unit(unit.name());
            }
        }
        self.memory.squash_after(keep);
        let writers: Vec<(Reg, InstId)> = self
            .rob
            .iter()
            .filter_map(|e| Some((e.destination?, e.inst_id)))
            .collect();
        self.scoreboard.rebuild(writers, self.rs.pending_reads());
        let squashed_fetch = queue.len();
        queue.clear();

        self.stats.recoveries += 1;
        self.stats.flushed += flushed.len() as u64;
        tracing::warn!(
            after = %keep,
            rob = flushed.len(),
            rs = dropped,
            queue = squashed_fetch,
            cycle = self.cycle,
            "pipeline recovery"
        );
    }

    /// Returns true when nothing is in flight and every store has drained.
    pub fn is_idle(&self) -> bool {
        self.rob.is_empty()
            && self.rs.is_empty()
            && self.deferred.is_empty()
            && self.units.iter().all(|u| !u.is_busy())
            && self.memory.is_drained()
    }

    /// Current cycle number (cycles completed so far).
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Architectural registers.
    pub const fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Architectural registers, mutably, for program setup.
    pub const fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// Reservation stations.
    pub const fn reservation_stations(&self) -> &ReservationStations {
        &self.rs
    }

    /// Scoreboard.
    pub const fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Bypass network.
    pub const fn forwarding(&self) -> &ForwardingUnit {
        &self.forwarding
    }

    /// Reorder buffer.
    pub const fn rob(&self) -> &ReorderBuffer {
        &self.rob
    }

    /// Functional units.
    pub fn units(&self) -> &[FunctionalUnit] {
        &self.units
    }

    /// Memory system.
    pub const fn memory(&self) -> &MemorySystem {
        &self.memory
    }

    /// Memory system, mutably, for program setup.
    pub const fn memory_mut(&mut self) -> &mut MemorySystem {
        &mut self.memory
    }

    /// Branch prediction unit.
    pub const fn branch(&self) -> &BranchUnit {
        &self.branch
    }

    /// Branch prediction unit, mutably, for fetch-time prediction.
    pub const fn branch_mut(&mut self) -> &mut BranchUnit {
        &mut self.branch
    }

    /// Engine counters.
    pub const fn stats(&self) -> &CoreStats {
        &self.stats
    }

    /// Instructions aborted by execution errors, in report order.
    pub fn failed(&self) -> &[FailedInstruction] {
        &self.failed
    }
}

/// Operand values visible to a waiting instruction: completed but
/// uncommitted results in the ROB, and the register file.
pub(super) struct InFlightValues<'a> {
    pub(super) rob: &'a ReorderBuffer,
    pub(super) regs: &'a RegisterFile,
}

impl OperandSource for InFlightValues<'_> {
    fn committed(&self, reg: Reg) -> u64 {
        self.regs.read(reg)
    }

    fn produced(&self, reg: Reg, producer: InstId) -> Option<(u64, Provenance)> {
        match self.rob.find(producer) {
            Some(entry) if entry.ready && entry.exception.is_none() => {
                entry.result.map(|v| (v, Provenance::ReorderBuffer))
            }
            Some(_) => None,
            // Already retired: the register file holds its value.
            None => Some((self.regs.read(reg), Provenance::RegisterFile)),
        }
    }
}
