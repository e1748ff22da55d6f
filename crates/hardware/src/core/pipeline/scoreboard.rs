//! Scoreboard for hazard detection and resource ownership.
//!
//! Tracks, for every architectural register, the in-flight instruction that
//! will write it and the in-flight instructions still waiting to read it, and
//! for every functional unit whether it is busy and for how long. Issue logic
//! consults [`Scoreboard::check_hazards`] before allocating anything.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::common::error::CapacityError;
use crate::core::pipeline::reservation::{Awaiting, ProducerLookup};
use crate::isa::abi::{NUM_REGS, Reg};
use crate::isa::instruction::{InstId, Instruction};
use crate::isa::opcode::{Opcode, UnitKind};

/// Dependency or resource conflict reported at issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HazardKind {
    /// Read after write: a source has an in-flight writer.
    #[serde(rename = "RAW")]
    Raw,
    /// Write after read: the destination has outstanding readers.
    #[serde(rename = "WAR")]
    War,
    /// Write after write: the destination already has an in-flight writer.
    #[serde(rename = "WAW")]
    Waw,
    /// No free unit of the required class.
    Structural,
}

impl HazardKind {
    /// Every kind, in reporting order.
    pub const ALL: [Self; 4] = [Self::Raw, Self::War, Self::Waw, Self::Structural];
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raw => "RAW",
            Self::War => "WAR",
            Self::Waw => "WAW",
            Self::Structural => "Structural",
        })
    }
}

/// Ownership state of one register.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterStatus {
    /// An in-flight instruction will write the register.
    pub busy: bool,
    /// That instruction.
    pub writer: Option<InstId>,
    /// In-flight instructions that have not yet read the register.
    pub readers: BTreeSet<InstId>,
    /// Scoreboard cycle of the last write allocation.
    pub last_write_cycle: Option<u64>,
}

/// Occupancy state of one functional unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionalUnitStatus {
    /// Unit name, e.g. `ALU0`.
    pub name: String,
    /// Unit class.
    pub kind: UnitKind,
    /// Whether the unit holds an instruction.
    pub busy: bool,
    /// Instruction occupying the unit.
    pub instruction: Option<InstId>,
    /// Its opcode.
    pub opcode: Option<Opcode>,
    /// Cycles until the result is ready.
    pub remaining_cycles: u32,
    /// The result is available and the unit is waiting to be released.
    pub result_ready: bool,
}

impl FunctionalUnitStatus {
    fn new(name: &str, kind: UnitKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            busy: false,
            instruction: None,
            opcode: None,
            remaining_cycles: 0,
            result_ready: false,
        }
    }
}

/// Hazard and allocation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreboardStats {
    /// RAW hazards seen at issue.
    pub raw: u64,
    /// WAR hazards seen at issue.
    pub war: u64,
    /// WAW hazards seen at issue.
    pub waw: u64,
    /// Structural hazards seen at issue.
    pub structural: u64,
    /// Write allocations.
    pub writes_allocated: u64,
    /// Zero-register write allocations ignored.
    pub zero_writes_ignored: u64,
}

/// Register and functional-unit ownership tracker.
#[derive(Clone, Debug)]
pub struct Scoreboard {
    int: Vec<RegisterStatus>,
    float: Vec<RegisterStatus>,
    units: Vec<FunctionalUnitStatus>,
    cycle: u64,
    stats: ScoreboardStats,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    /// Creates a scoreboard with every register free and no units.
    pub fn new() -> Self {
        Self {
            int: vec![RegisterStatus::default(); NUM_REGS],
            float: vec![RegisterStatus::default(); NUM_REGS],
            units: Vec::new(),
            cycle: 0,
            stats: ScoreboardStats::default(),
        }
    }

    fn status(&self, reg: Reg) -> &RegisterStatus {
        if reg.is_float() {
            &self.float[reg.index()]
        } else {
            &self.int[reg.index()]
        }
    }

    fn status_mut(&mut self, reg: Reg) -> &mut RegisterStatus {
        if reg.is_float() {
            &mut self.float[reg.index()]
        } else {
            &mut self.int[reg.index()]
        }
    }

    /// Ownership state of `reg`.
    pub fn register_status(&self, reg: Reg) -> &RegisterStatus {
        self.status(reg)
    }

    /// In-flight writer of `reg`.
    pub fn writer(&self, reg: Reg) -> Option<InstId> {
        self.status(reg).writer
    }

    /// Counters.
    pub const fn stats(&self) -> &ScoreboardStats {
        &self.stats
    }

    /// Declared units.
    pub fn units(&self) -> &[FunctionalUnitStatus] {
        &self.units
    }

    /// Declares a functional unit. Redeclaring a name is ignored.
    pub fn register_function_unit(&mut self, name: &str, kind: UnitKind) {
        if self.units.iter().any(|u| u.name == name) {
            return;
        }
        self.units.push(FunctionalUnitStatus::new(name, kind));
    }

    /// Number of free units of `kind`.
    pub fn free_units(&self, kind: UnitKind) -> usize {
        self.units
            .iter()
            .filter(|u| u.kind == kind && !u.busy)
            .count()
    }

    /// Name of the first free unit of `kind`.
    pub fn free_unit(&self, kind: UnitKind) -> Option<&str> {
        self.units
            .iter()
            .find(|u| u.kind == kind && !u.busy)
            .map(|u| u.name.as_str())
    }

    /// Hazards `instruction` would face if issued now.
    ///
    /// Pure query: repeated calls without intervening allocation agree.
    pub fn check_hazards(&self, instruction: &Instruction) -> BTreeSet<HazardKind> {
        let mut hazards = BTreeSet::new();
        let id = instruction.id;

        if instruction
            .sources()
            .into_iter()
            .filter(|r| !r.is_zero())
            .any(|r| self.status(r).writer.is_some_and(|w| w != id))
        {
            let _ = hazards.insert(HazardKind::Raw);
        }

        if let Some(dest) = instruction.destination().filter(|d| !d.is_zero()) {
            let status = self.status(dest);
            if status.readers.iter().any(|&r| r != id) {
                let _ = hazards.insert(HazardKind::War);
            }
            if status.writer.is_some_and(|w| w != id) {
                let _ = hazards.insert(HazardKind::Waw);
            }
        }

        if self.free_units(instruction.unit_kind()) == 0 {
            let _ = hazards.insert(HazardKind::Structural);
        }
        hazards
    }

    /// Adds `hazards` to the per-kind counters.
    pub fn record_hazards(&mut self, hazards: &BTreeSet<HazardKind>) {
        for hazard in hazards {
            match hazard {
                HazardKind::Raw => self.stats.raw += 1,
                HazardKind::War => self.stats.war += 1,
                HazardKind::Waw => self.stats.waw += 1,
                HazardKind::Structural => self.stats.structural += 1,
            }
        }
    }

    /// Marks `reg` as written by `writer`. Ignored for the zero register.
    ///
    /// The caller must have ruled out a WAW hazard; allocating a register
    /// already owned by a different writer is a defect.
    pub fn allocate_register_write(&mut self, reg: Reg, writer: InstId) {
        if reg.is_zero() {
            tracing::warn!(%writer, "write allocation for $zero ignored");
            self.stats.zero_writes_ignored += 1;
            return;
        }
        let cycle = self.cycle;
        let status = self.status_mut(reg);
        debug_assert!(
            status.writer.is_none_or(|w| w == writer),
            "{reg} already owned by {:?}, allocated to {writer}",
            status.writer
        );
        status.busy = true;
        status.writer = Some(writer);
        status.last_write_cycle = Some(cycle);
        self.stats.writes_allocated += 1;
    }

    /// Adds `reader` to the readers of `reg`. Idempotent.
    pub fn allocate_register_read(&mut self, reg: Reg, reader: InstId) {
        if reg.is_zero() {
            return;
        }
        let _ = self.status_mut(reg).readers.insert(reader);
    }

    /// Clears the writer of `reg`. Idempotent.
    pub fn deallocate_register(&mut self, reg: Reg) {
        let status = self.status_mut(reg);
        status.busy = false;
        status.writer = None;
    }

    /// Clears the writer of `reg` only if it is still `writer`.
    pub fn deallocate_register_if(&mut self, reg: Reg, writer: InstId) {
        if self.status(reg).writer == Some(writer) {
            self.deallocate_register(reg);
        }
    }

    /// Removes `reader` from the readers of `reg`. Idempotent.
    pub fn remove_register_read(&mut self, reg: Reg, reader: InstId) {
        let _ = self.status_mut(reg).readers.remove(&reader);
    }

    /// Occupies unit `name` with `instruction` for `cycles` cycles.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::NoFreeFunctionalUnit`] if the unit is unknown
    /// or busy.
    pub fn allocate_function_unit(
        &mut self,
        name: &str,
        instruction: &Instruction,
        cycles: u32,
    ) -> Result<(), CapacityError> {
        let unit = self
            .units
            .iter_mut()
            .find(|u| u.name == name && !u.busy)
            .ok_or(CapacityError::NoFreeFunctionalUnit)?;
        unit.busy = true;
        unit.instruction = Some(instruction.id);
        unit.opcode = Some(instruction.opcode);
        unit.remaining_cycles = cycles;
        unit.result_ready = cycles == 0;
        Ok(())
    }

    /// Releases unit `name`. Idempotent.
    pub fn deallocate_function_unit(&mut self, name: &str) {
        if let Some(unit) = self.units.iter_mut().find(|u| u.name == name) {
            *unit = FunctionalUnitStatus::new(&unit.name, unit.kind);
        }
    }

    /// Advances one cycle: busy units count down and flag their result ready
    /// on reaching zero.
    pub fn update_cycle(&mut self) {
        for unit in self.units.iter_mut().filter(|u| u.busy) {
            unit.remaining_cycles = unit.remaining_cycles.saturating_sub(1);
            if unit.remaining_cycles == 0 {
                unit.result_ready = true;
            }
        }
        self.cycle += 1;
    }

    /// Restores register ownership from the surviving in-flight instructions
    /// after a flush. Unit state is kept.
    pub fn rebuild(
        &mut self,
        writers: impl IntoIterator<Item = (Reg, InstId)>,
        readers: impl IntoIterator<Item = (Reg, InstId)>,
    ) {
        for status in self.int.iter_mut().chain(self.float.iter_mut()) {
            status.busy = false;
            status.writer = None;
            status.readers.clear();
        }
        for (reg, id) in writers {
            if !reg.is_zero() {
                let status = self.status_mut(reg);
                status.busy = true;
                status.writer = Some(id);
            }
        }
        for (reg, id) in readers {
            self.allocate_register_read(reg, id);
        }
    }

    /// Frees every register and unit and zeroes the counters.
    pub fn reset(&mut self) {
        let units: Vec<(String, UnitKind)> =
            self.units.iter().map(|u| (u.name.clone(), u.kind)).collect();
        *self = Self::new();
        for (name, kind) in units {
            self.register_function_unit(&name, kind);
        }
        tracing::info!("scoreboard reset");
    }

    /// Text rendering of busy registers and all units.
    pub fn visualize_state(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Registers (cycle {}):", self.cycle);
        let regs = (0..NUM_REGS)
            .map(|i| (Reg::Int(i as u8), &self.int[i]))
            .chain((0..NUM_REGS).map(|i| (Reg::Float(i as u8), &self.float[i])));
        for (reg, status) in regs.filter(|(_, s)| s.busy || !s.readers.is_empty()) {
            let writer = status.writer.map_or_else(|| "-".to_string(), |w| w.to_string());
            let readers: Vec<String> = status.readers.iter().map(ToString::to_string).collect();
            let _ = writeln!(
                out,
                "  {reg:<6} writer {writer:<6} readers [{}]",
                readers.join(", ")
            );
        }
        let _ = writeln!(out, "Units:");
        for unit in &self.units {
            let state = match (unit.busy, unit.result_ready) {
                (false, _) => "idle".to_string(),
                (true, true) => "ready".to_string(),
                (true, false) => format!("{} cycles", unit.remaining_cycles),
            };
            let inst = unit.instruction.map_or_else(String::new, |i| i.to_string());
            let _ = writeln!(out, "  {:<6} {state:<10} {inst}", unit.name);
        }
        out
    }
}

impl ProducerLookup for Scoreboard {
    fn awaiting(&self, reg: Reg) -> Awaiting {
        self.writer(reg)
            .map_or(Awaiting::Committed, Awaiting::Producer)
    }
}
