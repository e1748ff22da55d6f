//! Floating-Point Unit (FPU).
//!
//! Double-precision add, subtract, multiply and divide. Floating-point
//! registers hold IEEE 754 `f64` bit patterns; any NaN result is replaced
//! with the canonical quiet NaN so results do not leak operand payloads.

use crate::common::error::ExecutionError;
use crate::common::reg::RegisterFile;
use crate::isa::instruction::Instruction;
use crate::isa::opcode::{Opcode, UnitKind};

/// Canonical quiet NaN for IEEE 754 double-precision (positive, quiet, zero payload).
const CANONICAL_NAN_F64: u64 = 0x7ff8_0000_0000_0000;

/// Floating-Point Unit (FPU) for floating-point operations.
#[derive(Debug)]
pub struct Fpu;

impl Fpu {
    /// Executes `FADD`, `FSUB`, `FMUL` or `FDIV`.
    ///
    /// Returns the result as raw `f64` bits.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::UnsupportedOpcode`] for any other opcode.
    /// - [`ExecutionError::DivisionByZero`] for `FDIV` by zero (either sign).
    /// - [`ExecutionError::MalformedOperands`] when the operands are not
    ///   three registers.
    pub fn execute(inst: &Instruction, regs: &RegisterFile) -> Result<u64, ExecutionError> {
        let op = inst.opcode;
        if op.unit() != UnitKind::Fpu {
            return Err(ExecutionError::UnsupportedOpcode {
                unit: UnitKind::Fpu,
                opcode: op,
            });
        }
        let a = f64::from_bits(inst.operand_value(inst.reg_operand(1)?, regs));
        let b = f64::from_bits(inst.operand_value(inst.reg_operand(2)?, regs));

        let result = match op {
            Opcode::Fadd => a + b,
            Opcode::Fsub => a - b,
            Opcode::Fmul => a * b,
            Opcode::Fdiv => {
                if b == 0.0 {
                    return Err(ExecutionError::DivisionByZero(op));
                }
                a / b
            }
            _ => {
                return Err(ExecutionError::UnsupportedOpcode {
                    unit: UnitKind::Fpu,
                    opcode: op,
                });
            }
        };
        Ok(canonicalize(result).to_bits())
    }
}

#[inline]
fn canonicalize(f: f64) -> f64 {
    if f.is_nan() {
        f64::from_bits(CANONICAL_NAN_F64)
    } else {
        f
    }
}
