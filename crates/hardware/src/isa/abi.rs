//! MIPS-style register names.
//!
//! Defines the architectural register identifier used throughout the
//! simulator and the textual aliases accepted for it:
//! 1. **Integer registers:** `$zero`..`$ra`, `$0`..`$31`, `r0`..`r31` or a bare index.
//! 2. **Floating-point registers:** `$f0`..`$f31` or `f0`..`f31`.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::common::error::ExecutionError;

/// Number of registers in each register class.
pub const NUM_REGS: usize = 32;

/// ABI names of the integer registers, indexed by register number.
pub const INT_NAMES: [&str; NUM_REGS] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// Register 28, the global pointer.
pub const REG_GP: usize = 28;
/// Register 29, the stack pointer.
pub const REG_SP: usize = 29;
/// Register 31, the return address written by `JAL`/`JALR`.
pub const REG_RA: usize = 31;

/// An architectural register.
///
/// Ordering places every integer register before every floating-point
/// register, which keeps maps keyed by `Reg` in a stable display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reg {
    /// Integer register `0..32`.
    Int(u8),
    /// Floating-point register `0..32`.
    Float(u8),
}

impl Reg {
    /// The hardwired zero register.
    pub const ZERO: Self = Self::Int(0);
    /// The return-address register.
    pub const RA: Self = Self::Int(REG_RA as u8);

    /// Returns true for `$zero`, which always reads 0 and ignores writes.
    #[inline]
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Int(0))
    }

    /// Returns true for floating-point registers.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// Register number within its class.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Int(i) | Self::Float(i) => i as usize,
        }
    }

    /// Resolves a register name, accepting every alias listed in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::InvalidRegister`] when the name matches no alias
    /// or the index is out of range.
    pub fn parse(name: &str) -> Result<Self, ExecutionError> {
        let trimmed = name.trim();
        let invalid = || ExecutionError::InvalidRegister(trimmed.to_string());
        let lower = trimmed.to_ascii_lowercase();

        if let Some(pos) = INT_NAMES.iter().position(|n| *n == lower) {
            return Ok(Self::Int(pos as u8));
        }
        // `$s8` is the conventional alias of `$fp`.
        if lower == "$s8" {
            return Ok(Self::Int(30));
        }

        let body = lower.strip_prefix('$').unwrap_or(lower.as_str());
        let (float, digits) = if let Some(rest) = body.strip_prefix('f') {
            (true, rest)
        } else if let Some(rest) = body.strip_prefix('r') {
            (false, rest)
        } else {
            (false, body)
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let idx: usize = digits.parse().map_err(|_| invalid())?;
        if idx >= NUM_REGS {
            return Err(invalid());
        }
        Ok(if float {
            Self::Float(idx as u8)
        } else {
            Self::Int(idx as u8)
        })
    }
}

impl FromStr for Reg {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => f.write_str(INT_NAMES[*i as usize % NUM_REGS]),
            Self::Float(i) => write!(f, "$f{i}"),
        }
    }
}

impl Serialize for Reg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
