//! Floating-point register file.
//!
//! Holds the 32 floating-point registers as raw IEEE 754 double-precision bit
//! patterns, so values move through the pipeline as plain 64-bit words.

use crate::isa::abi::NUM_REGS;

/// Floating-point register file.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Fpr {
    fregs: [u64; NUM_REGS],
}

impl Fpr {
    /// Creates a register file with every register at `+0.0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register as raw bits.
    #[inline]
    pub fn read(&self, idx: usize) -> u64 {
        self.fregs[idx]
    }

    /// Writes a register from raw bits.
    #[inline]
    pub fn write(&mut self, idx: usize, val: u64) {
        self.fregs[idx] = val;
    }

    /// Reads a register as an `f64`.
    pub fn read_f64(&self, idx: usize) -> f64 {
        f64::from_bits(self.fregs[idx])
    }
}
