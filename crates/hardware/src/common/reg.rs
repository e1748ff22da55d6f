//! Unified register file.
//!
//! The register file is the only owner of architectural register values.
//! Pipeline structures refer to registers by [`Reg`] and hold cached copies.
//! It provides:
//! 1. **Typed access:** `read`/`write` by [`Reg`].
//! 2. **Named access:** `read_register`/`write_register` accepting every textual alias.
//! 3. **Observability:** A formatted dump for tracing.

use crate::common::error::ExecutionError;
use crate::core::arch::fpr::Fpr;
use crate::core::arch::gpr::Gpr;
use crate::isa::abi::Reg;

/// Integer and floating-point architectural registers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    gpr: Gpr,
    fpr: Fpr,
}

impl RegisterFile {
    /// Creates a register file in its reset state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register. `$zero` always reads 0.
    #[inline]
    pub fn read(&self, reg: Reg) -> u64 {
        match reg {
            Reg::Int(i) => self.gpr.read(i as usize),
            Reg::Float(i) => self.fpr.read(i as usize),
        }
    }

    /// Writes a register. Writes to `$zero` are ignored.
    #[inline]
    pub fn write(&mut self, reg: Reg, val: u64) {
        match reg {
            Reg::Int(i) => self.gpr.write(i as usize, val),
            Reg::Float(i) => self.fpr.write(i as usize, val),
        }
    }

    /// Reads a register by name (`$t0`, `$8`, `r8`, `8`, `$f2`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::InvalidRegister`] for an unknown name.
    pub fn read_register(&self, name: &str) -> Result<u64, ExecutionError> {
        Ok(self.read(Reg::parse(name)?))
    }

    /// Writes a register by name.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::InvalidRegister`] for an unknown name.
    pub fn write_register(&mut self, name: &str, val: u64) -> Result<(), ExecutionError> {
        self.write(Reg::parse(name)?, val);
        Ok(())
    }

    /// Reads a floating-point register as `f64`.
    pub fn read_f64(&self, idx: usize) -> f64 {
        self.fpr.read_f64(idx)
    }

    /// Writes a floating-point register from an `f64`.
    pub fn write_f64(&mut self, idx: usize, val: f64) {
        self.fpr.write(idx, val.to_bits());
    }

    /// Restores the reset state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Formats the integer registers for tracing.
    pub fn dump(&self) -> String {
        self.gpr.dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arch::gpr::{INITIAL_GP, INITIAL_SP};

    #[test]
    fn test_zero_register_ignores_writes() {
        let mut rf = RegisterFile::new();
        rf.write(Reg::ZERO, 42);
        assert_eq!(rf.read(Reg::ZERO), 0);
        assert!(rf.write_register("$zero", 7).is_ok());
        assert_eq!(rf.read_register("$0").ok(), Some(0));
    }

    #[test]
    fn test_named_access_aliases() {
        let mut rf = RegisterFile::new();
        assert!(rf.write_register("$t1", 10).is_ok());
        assert_eq!(rf.read_register("r9").ok(), Some(10));
        assert_eq!(rf.read_register("9").ok(), Some(10));
        assert!(rf.read_register("$nope").is_err());
    }

    #[test]
    fn test_initial_pointers() {
        let rf = RegisterFile::new();
        assert_eq!(rf.read_register("$sp").ok(), Some(INITIAL_SP));
        assert_eq!(rf.read_register("$gp").ok(), Some(INITIAL_GP));
    }

    #[test]
    fn test_float_bits_round_trip() {
        let mut rf = RegisterFile::new();
        rf.write_f64(2, 1.5);
        assert_eq!(rf.read(Reg::Float(2)), 1.5f64.to_bits());
        assert!((rf.read_f64(2) - 1.5).abs() < f64::EPSILON);
    }
}
