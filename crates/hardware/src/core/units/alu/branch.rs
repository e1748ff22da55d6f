//! Branch condition evaluation.

use crate::common::error::ExecutionError;
use crate::isa::opcode::Opcode;

/// Evaluates the condition of a conditional branch.
///
/// `BLT`/`BGE` compare signed, `BLTU`/`BGEU` unsigned.
///
/// # Errors
///
/// Returns [`ExecutionError::MalformedOperands`] for a non-branch opcode.
pub fn taken(op: Opcode, a: u64, b: u64) -> Result<bool, ExecutionError> {
    match op {
        Opcode::Beq => Ok(a == b),
        Opcode::Bne => Ok(a != b),
        Opcode::Blt => Ok((a as i64) < (b as i64)),
        Opcode::Bge => Ok((a as i64) >= (b as i64)),
        Opcode::Bltu => Ok(a < b),
        Opcode::Bgeu => Ok(a >= b),
        _ => Err(ExecutionError::MalformedOperands(op)),
    }
}
