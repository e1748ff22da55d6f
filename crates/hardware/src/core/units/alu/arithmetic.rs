//! ALU arithmetic operations.
//!
//! Integer addition, subtraction, multiplication and division on 64-bit
//! words. Addition, subtraction and multiplication wrap; division is signed
//! and rejects a zero divisor.

use crate::common::error::ExecutionError;
use crate::isa::opcode::Opcode;

/// Executes an integer arithmetic operation.
///
/// `b` is the second register value or, for `ADDI`/`SUBI`, the immediate.
///
/// # Errors
///
/// Returns [`ExecutionError::DivisionByZero`] for `DIV` with `b == 0`, and
/// [`ExecutionError::MalformedOperands`] for an opcode outside this group.
pub fn execute(op: Opcode, a: u64, b: u64) -> Result<u64, ExecutionError> {
    match op {
        Opcode::Add | Opcode::Addi => Ok(a.wrapping_add(b)),
        Opcode::Sub | Opcode::Subi => Ok(a.wrapping_sub(b)),
        Opcode::Mul => Ok((a as i64).wrapping_mul(b as i64) as u64),
        Opcode::Div => {
            if b == 0 {
                return Err(ExecutionError::DivisionByZero(op));
            }
            // i64::MIN / -1 wraps to i64::MIN.
            Ok((a as i64).wrapping_div(b as i64) as u64)
        }
        _ => Err(ExecutionError::MalformedOperands(op)),
    }
}
