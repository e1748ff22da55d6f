//! Instruction set definitions.
//!
//! A small MIPS-flavoured instruction set: integer arithmetic and logic,
//! byte/half/word loads and stores, conditional branches, jumps and
//! double-precision floating-point arithmetic.

/// Register names and aliases.
pub mod abi;

/// In-flight instruction record and derived fields.
pub mod instruction;

/// Opcode table (category, format, unit class, latency).
pub mod opcode;

/// Assembly line parser.
pub mod parse;

pub use abi::Reg;
pub use instruction::{InstId, Instruction, Operand, Status};
pub use opcode::{Category, Opcode, UnitKind};
