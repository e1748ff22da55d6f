//! Error taxonomy.
//!
//! This module defines every error the simulator reports. It provides:
//! 1. **Execution errors:** Abort a single instruction; the simulation continues.
//! 2. **Capacity errors:** Ordinary stall results from full structures.
//! 3. **Rejections:** A capacity or execution error that hands the instruction back.
//! 4. **Input errors:** Malformed assembly or configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::isa::instruction::Instruction;
use crate::isa::opcode::{Opcode, UnitKind};

/// Failure while executing one instruction.
///
/// The instruction is marked failed and reported at commit; shared pipeline
/// state is left consistent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The opcode was routed to a unit that does not implement it.
    #[error("{unit} cannot execute {opcode}")]
    UnsupportedOpcode {
        /// Unit class that received the instruction.
        unit: UnitKind,
        /// Offending opcode.
        opcode: Opcode,
    },

    /// Integer or floating-point division with a zero divisor.
    #[error("division by zero in {0}")]
    DivisionByZero(Opcode),

    /// A register name matched no alias.
    #[error("invalid register `{0}`")]
    InvalidRegister(String),

    /// A memory access fell outside main memory.
    #[error("{size}-byte access at {address:#x} is outside memory")]
    MemoryOutOfBounds {
        /// First byte of the access.
        address: u64,
        /// Access width in bytes.
        size: usize,
    },

    /// The operand list does not match the opcode's format.
    #[error("malformed operands for {0}")]
    MalformedOperands(Opcode),

    /// An instruction was started on a unit that is still executing another.
    #[error("unit {unit} is busy")]
    UnitBusy {
        /// Name of the occupied unit.
        unit: String,
    },
}

/// A full structure; the caller stalls and retries next cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// Every reservation station entry is busy.
    #[error("no free reservation station")]
    NoFreeReservationStation,

    /// The reorder buffer is at capacity.
    #[error("reorder buffer full")]
    ReorderBufferFull,

    /// No functional unit of the required class is free.
    #[error("no free functional unit")]
    NoFreeFunctionalUnit,
}

/// An error that returns ownership of the instruction to the caller.
#[derive(Debug, Error)]
#[error("{instruction} rejected: {error}")]
pub struct Rejected<E: std::error::Error + 'static> {
    /// The instruction that could not proceed.
    pub instruction: Box<Instruction>,
    /// Why it was rejected.
    #[source]
    pub error: E,
}

impl<E: std::error::Error + 'static> Rejected<E> {
    /// Wraps an instruction and the reason it was turned away.
    pub fn new(instruction: Instruction, error: E) -> Self {
        Self {
            instruction: Box::new(instruction),
            error,
        }
    }
}

/// Malformed assembly text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The mnemonic is not a supported opcode.
    #[error("line {line}: unknown opcode `{mnemonic}`")]
    UnknownOpcode {
        /// 1-based source line.
        line: usize,
        /// Mnemonic as written.
        mnemonic: String,
    },

    /// An operand is not a register, immediate or `offset(base)` reference.
    #[error("line {line}: invalid operand `{operand}`")]
    InvalidOperand {
        /// 1-based source line.
        line: usize,
        /// Operand as written.
        operand: String,
    },

    /// A register operand names no register.
    #[error("line {line}: {source}")]
    InvalidRegister {
        /// 1-based source line.
        line: usize,
        /// Underlying register error.
        #[source]
        source: ExecutionError,
    },

    /// Wrong number of operands for the opcode.
    #[error("line {line}: {opcode} expects {expected} operands, found {found}")]
    OperandCount {
        /// 1-based source line.
        line: usize,
        /// Opcode being parsed.
        opcode: Opcode,
        /// Operands required by the format.
        expected: usize,
        /// Operands present.
        found: usize,
    },
}

/// Unreadable or invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON text does not describe a configuration.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is outside its permitted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error for loading and running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Program text failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The program file could not be read.
    #[error("cannot read program {path}: {source}")]
    Io {
        /// Program path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
