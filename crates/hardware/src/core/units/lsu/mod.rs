//! Load/Store Unit (LSU).
//!
//! Computes `offset(base)` effective addresses and performs the access
//! through a [`DataPort`]. Loads sign-extend to 64 bits; stores hand their
//! data to the port, which buffers it until the store commits.

use crate::common::error::ExecutionError;
use crate::common::reg::RegisterFile;
use crate::isa::instruction::Instruction;
use crate::isa::opcode::UnitKind;
use crate::soc::traits::{AccessOutcome, DataPort};

/// Result of one memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemAccess {
    /// Loaded value (sign-extended) or stored data.
    pub value: u64,
    /// Effective address.
    pub addr: u64,
    /// Extra cycles charged on top of the base latency.
    pub penalty: u32,
    /// Where a load was satisfied; `None` for stores.
    pub outcome: Option<AccessOutcome>,
}

/// Load/Store Unit (LSU) for memory operations.
#[derive(Debug)]
pub struct Lsu;

impl Lsu {
    /// Effective address of a load or store.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MalformedOperands`] without an
    /// `offset(base)` operand.
    pub fn effective_address(inst: &Instruction, regs: &RegisterFile) -> Result<u64, ExecutionError> {
        let (offset, base) = inst.mem_operand()?;
        Ok(inst.operand_value(base, regs).wrapping_add(offset as u64))
    }

    /// Performs the access of a load or store.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::UnsupportedOpcode`] for non-memory opcodes.
    /// - [`ExecutionError::MemoryOutOfBounds`] from the port.
    /// - [`ExecutionError::MalformedOperands`] for a bad operand list.
    pub fn execute(
        inst: &Instruction,
        regs: &RegisterFile,
        port: &mut dyn DataPort,
    ) -> Result<MemAccess, ExecutionError> {
        let op = inst.opcode;
        let Some(width) = op.width() else {
            return Err(ExecutionError::UnsupportedOpcode {
                unit: UnitKind::Lsu,
                opcode: op,
            });
        };
        let addr = Self::effective_address(inst, regs)?;

        if op.is_load() {
            let load = port.load(inst.id, addr, width)?;
            tracing::debug!(id = %inst.id, addr, outcome = ?load.outcome, "load");
            Ok(MemAccess {
                value: width.sign_extend(load.value),
                addr,
                penalty: load.penalty,
                outcome: Some(load.outcome),
            })
        } else {
            let data = inst.operand_value(inst.reg_operand(0)?, regs);
            port.store(inst.id, addr, width, data)?;
            tracing::debug!(id = %inst.id, addr, data, "store buffered");
            Ok(MemAccess {
                value: data,
                addr,
                penalty: 0,
                outcome: None,
            })
        }
    }
}
