//! ALU logical and comparison operations.
//!
//! Bitwise AND, OR, XOR and signed set-less-than, in register and immediate
//! forms. The comparison result is always 0 or 1.

use crate::common::error::ExecutionError;
use crate::isa::opcode::Opcode;

/// Executes a logical or comparison operation.
///
/// # Errors
///
/// Returns [`ExecutionError::MalformedOperands`] for an opcode outside this
/// group.
pub fn execute(op: Opcode, a: u64, b: u64) -> Result<u64, ExecutionError> {
    match op {
        Opcode::And | Opcode::Andi => Ok(a & b),
        Opcode::Or | Opcode::Ori => Ok(a | b),
        Opcode::Xor | Opcode::Xori => Ok(a ^ b),
        Opcode::Slt | Opcode::Slti => Ok(u64::from((a as i64) < (b as i64))),
        _ => Err(ExecutionError::MalformedOperands(op)),
    }
}
