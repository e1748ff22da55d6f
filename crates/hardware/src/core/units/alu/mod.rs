//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used in the Execute stage. Besides
//! arithmetic and logic it resolves conditional branches and jumps, so every
//! control-flow instruction leaves the ALU with a [`BranchOutcome`].
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub, Mul, Div and their immediate forms
//! - [`logic`]:      And, Or, Xor, Slt and their immediate forms
//! - [`branch`]:     Beq, Bne, Blt, Bge, Bltu, Bgeu conditions

/// Integer arithmetic operations (add, subtract, multiply, divide).
pub mod arithmetic;

/// Bitwise logical and comparison operations (and, or, xor, slt).
pub mod logic;

/// Conditional branch evaluation.
pub mod branch;

use crate::common::error::ExecutionError;
use crate::common::reg::RegisterFile;
use crate::isa::instruction::{BranchOutcome, Instruction};
use crate::isa::opcode::{Category, Format, UnitKind};

/// Arithmetic Logic Unit (ALU) for integer operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Executes an integer, branch or jump instruction.
    ///
    /// Source registers are read through [`Instruction::operand_value`], so
    /// values captured by the reservation station take precedence over the
    /// register file. Control-flow instructions get their `outcome` set.
    ///
    /// # Returns
    ///
    /// The destination value for arithmetic and logic, the link address for
    /// `JAL`/`JALR`, the target for `J`/`JR`, and 1 or 0 (taken or not) for
    /// conditional branches. `NOP` yields 0.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::UnsupportedOpcode`] for memory and floating-point
    ///   opcodes.
    /// - [`ExecutionError::DivisionByZero`] for `DIV` by zero.
    /// - [`ExecutionError::MalformedOperands`] when the operand list does not
    ///   match the opcode's format.
    ///
    /// # Examples
    ///
    /// ```
    /// use sspsim_core::common::reg::RegisterFile;
    /// use sspsim_core::core::units::alu::Alu;
    /// use sspsim_core::isa::instruction::{InstId, Instruction};
    ///
    /// let mut regs = RegisterFile::new();
    /// regs.write_register("$t1", 40).unwrap();
    /// let mut inst = Instruction::from_asm(InstId(0), 0, "ADDI $t0, $t1, 2").unwrap();
    /// assert_eq!(Alu::execute(&mut inst, &regs), Ok(42));
    /// ```
    pub fn execute(inst: &mut Instruction, regs: &RegisterFile) -> Result<u64, ExecutionError> {
        let op = inst.opcode;
        if op.unit() != UnitKind::Alu {
            return Err(ExecutionError::UnsupportedOpcode {
                unit: UnitKind::Alu,
                opcode: op,
            });
        }

        match op.format() {
            Format::Register => {
                let a = inst.operand_value(inst.reg_operand(1)?, regs);
                let b = inst.operand_value(inst.reg_operand(2)?, regs);
                Self::compute(inst, a, b)
            }
            Format::Immediate => {
                let a = inst.operand_value(inst.reg_operand(1)?, regs);
                let b = inst.imm_operand(2)? as u64;
                Self::compute(inst, a, b)
            }
            Format::Branch => {
                let a = inst.operand_value(inst.reg_operand(0)?, regs);
                let b = inst.operand_value(inst.reg_operand(1)?, regs);
                let taken = branch::taken(op, a, b)?;
                let target = inst
                    .static_target()
                    .ok_or(ExecutionError::MalformedOperands(op))?;
                let next_pc = if taken { target } else { inst.fallthrough() };
                inst.outcome = Some(BranchOutcome {
                    taken,
                    target,
                    next_pc,
                });
                Ok(u64::from(taken))
            }
            Format::Jump => {
                let target = inst.imm_operand(0)? as u64;
                Ok(Self::jump(inst, target))
            }
            Format::JumpRegister => {
                let target = inst.operand_value(inst.reg_operand(0)?, regs);
                Ok(Self::jump(inst, target))
            }
            Format::None => Ok(0),
            Format::Load | Format::Store => Err(ExecutionError::UnsupportedOpcode {
                unit: UnitKind::Alu,
                opcode: op,
            }),
        }
    }

    fn compute(inst: &Instruction, a: u64, b: u64) -> Result<u64, ExecutionError> {
        match inst.category() {
            Category::Arithmetic => arithmetic::execute(inst.opcode, a, b),
            Category::Logical => logic::execute(inst.opcode, a, b),
            _ => Err(ExecutionError::MalformedOperands(inst.opcode)),
        }
    }

    fn jump(inst: &mut Instruction, target: u64) -> u64 {
        inst.outcome = Some(BranchOutcome {
            taken: true,
            target,
            next_pc: target,
        });
        if inst.opcode.links() {
            inst.fallthrough()
        } else {
            target
        }
    }
}
