//! In-flight instruction record.
//!
//! An [`Instruction`] combines an immutable identity (sequence id, address,
//! opcode, operands) with the mutable progress fields the pipeline fills in as
//! it moves through issue, execute and commit. Category, source registers,
//! destination and latency are derived from the opcode table on demand rather
//! than stored.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::common::error::{ExecutionError, ParseError};
use crate::common::reg::RegisterFile;
use crate::core::pipeline::rob::RobId;
use crate::isa::abi::Reg;
use crate::isa::opcode::{Category, Format, Opcode, UnitKind};
use crate::isa::parse;

/// Program-order sequence number, unique for the lifetime of a simulation.
///
/// A smaller id is always older in program order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstId(pub u64);

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One operand as written in the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// A register.
    Reg(Reg),
    /// A literal.
    Imm(i64),
    /// `offset(base)` memory reference.
    Mem {
        /// Signed byte offset.
        offset: i64,
        /// Base register.
        base: Reg,
    },
}

impl Operand {
    /// The register named by this operand, including a memory base.
    pub const fn register(self) -> Option<Reg> {
        match self {
            Self::Reg(r) | Self::Mem { base: r, .. } => Some(r),
            Self::Imm(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(r) => write!(f, "{r}"),
            Self::Imm(v) => write!(f, "{v}"),
            Self::Mem { offset, base } => write!(f, "{offset}({base})"),
        }
    }
}

/// Pipeline progress of an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Fetched, not yet decoded.
    #[default]
    Fetched,
    /// Decoded and waiting in the fetch queue.
    Decoded,
    /// Holding a reservation station and a ROB slot.
    Issued,
    /// Occupying a functional unit.
    Executing,
    /// Performing its memory access in the load/store unit.
    MemoryAccess,
    /// Result broadcast; waiting in the ROB.
    WriteBack,
    /// Retired.
    Committed,
    /// Aborted by an execution error.
    Failed,
}

/// Resolved control flow of a branch or jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Whether control left the fall-through path.
    pub taken: bool,
    /// Target address when taken.
    pub target: u64,
    /// Address of the next instruction actually executed.
    pub next_pc: u64,
}

/// An instruction and its pipeline progress.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    /// Program-order identity.
    pub id: InstId,
    /// Byte address of the instruction.
    pub pc: u64,
    /// Operation.
    pub opcode: Opcode,
    /// Operands as written.
    pub operands: Vec<Operand>,
    /// Pipeline progress.
    pub status: Status,
    /// Name of the functional unit executing or having executed it.
    pub unit: Option<String>,
    /// Reorder buffer slot, from issue to commit.
    pub rob_id: Option<RobId>,
    /// Computed value: destination value, link address or store data.
    pub result: Option<u64>,
    /// Source register values captured when the instruction left its
    /// reservation station.
    pub resolved: BTreeMap<Reg, u64>,
    /// Cycle the instruction entered a reservation station.
    pub issue_cycle: Option<u64>,
    /// Cycle the result was broadcast.
    pub completion_cycle: Option<u64>,
    /// Next address chosen by fetch, for branches and jumps.
    pub predicted_next: Option<u64>,
    /// Resolved control flow, for branches and jumps.
    pub outcome: Option<BranchOutcome>,
}

impl Instruction {
    /// Creates a freshly fetched instruction.
    pub const fn new(id: InstId, pc: u64, opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self {
            id,
            pc,
            opcode,
            operands,
            status: Status::Fetched,
            unit: None,
            rob_id: None,
            result: None,
            resolved: BTreeMap::new(),
            issue_cycle: None,
            completion_cycle: None,
            predicted_next: None,
            outcome: None,
        }
    }

    /// Parses one line of assembly into an instruction.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] (reported as line 1) when the text is malformed.
    pub fn from_asm(id: InstId, pc: u64, text: &str) -> Result<Self, ParseError> {
        let (opcode, operands) = parse::parse_line(text, 1)?;
        Ok(Self::new(id, pc, opcode, operands))
    }

    /// Instruction category.
    #[inline]
    pub const fn category(&self) -> Category {
        self.opcode.category()
    }

    /// Functional-unit class.
    #[inline]
    pub const fn unit_kind(&self) -> UnitKind {
        self.opcode.unit()
    }

    /// Base latency from the opcode table.
    #[inline]
    pub const fn latency(&self) -> u32 {
        self.opcode.latency()
    }

    /// Destination register, if the instruction writes one.
    ///
    /// Stores, branches and plain jumps have none; `JAL`/`JALR` write `$ra`.
    pub fn destination(&self) -> Option<Reg> {
        if self.opcode.links() {
            return Some(Reg::RA);
        }
        match self.opcode.format() {
            Format::Register | Format::Immediate | Format::Load => match self.operands.first() {
                Some(Operand::Reg(r)) => Some(*r),
                _ => None,
            },
            Format::Store | Format::Branch | Format::Jump | Format::JumpRegister | Format::None => {
                None
            }
        }
    }

    /// Source registers in operand order, without duplicates.
    pub fn sources(&self) -> Vec<Reg> {
        let positions: &[usize] = match self.opcode.format() {
            Format::Register => &[1, 2],
            Format::Immediate | Format::Load => &[1],
            Format::Store | Format::Branch => &[0, 1],
            Format::JumpRegister => &[0],
            Format::Jump | Format::None => &[],
        };
        let mut regs = Vec::with_capacity(positions.len());
        for reg in positions
            .iter()
            .filter_map(|&i| self.operands.get(i).and_then(|op| op.register()))
        {
            if !regs.contains(&reg) {
                regs.push(reg);
            }
        }
        regs
    }

    /// Literal operands, in operand order.
    pub fn immediates(&self) -> impl Iterator<Item = i64> + '_ {
        self.operands.iter().filter_map(|op| match op {
            Operand::Imm(v) => Some(*v),
            _ => None,
        })
    }

    /// Operand `idx` as a register.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MalformedOperands`] if that operand is missing
    /// or is not a register.
    pub fn reg_operand(&self, idx: usize) -> Result<Reg, ExecutionError> {
        match self.operands.get(idx) {
            Some(Operand::Reg(r)) => Ok(*r),
            _ => Err(ExecutionError::MalformedOperands(self.opcode)),
        }
    }

    /// Operand `idx` as a literal.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MalformedOperands`] if that operand is missing
    /// or is not a literal.
    pub fn imm_operand(&self, idx: usize) -> Result<i64, ExecutionError> {
        match self.operands.get(idx) {
            Some(Operand::Imm(v)) => Ok(*v),
            _ => Err(ExecutionError::MalformedOperands(self.opcode)),
        }
    }

    /// The `offset(base)` operand of a load or store.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MalformedOperands`] if there is none.
    pub fn mem_operand(&self) -> Result<(i64, Reg), ExecutionError> {
        self.operands
            .iter()
            .find_map(|op| match op {
                Operand::Mem { offset, base } => Some((*offset, *base)),
                _ => None,
            })
            .ok_or(ExecutionError::MalformedOperands(self.opcode))
    }

    /// Value of a source register: the captured snapshot when present,
    /// otherwise the architectural value.
    pub fn operand_value(&self, reg: Reg, regs: &RegisterFile) -> u64 {
        if reg.is_zero() {
            return 0;
        }
        self.resolved
            .get(&reg)
            .copied()
            .unwrap_or_else(|| regs.read(reg))
    }

    /// Address of the next sequential instruction.
    #[inline]
    pub const fn fallthrough(&self) -> u64 {
        self.pc.wrapping_add(4)
    }

    /// Target known without executing: `pc + 4 + 4 * offset` for branches and
    /// the absolute address for `J`/`JAL`. `JR`/`JALR` have none.
    pub fn static_target(&self) -> Option<u64> {
        match self.opcode.format() {
            Format::Branch => {
                let offset = self.imm_operand(2).ok()?;
                Some(self.fallthrough().wrapping_add(offset.wrapping_mul(4) as u64))
            }
            Format::Jump => self.imm_operand(0).ok().map(|t| t as u64),
            _ => None,
        }
    }

    /// Returns true if the resolved control flow differs from the prediction.
    pub fn mispredicted(&self) -> bool {
        match (self.outcome, self.predicted_next) {
            (Some(outcome), Some(predicted)) => outcome.next_pc != predicted,
            (Some(outcome), None) => outcome.next_pc != self.fallthrough(),
            (None, _) => false,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{op}")?;
        }
        Ok(())
    }
}
