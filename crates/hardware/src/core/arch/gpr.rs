//! Integer register file.
//!
//! Holds the 32 integer registers. Register 0 (`$zero`) is hardwired to zero:
//! reads return 0 and writes are discarded.

use crate::isa::abi::{INT_NAMES, NUM_REGS, REG_GP, REG_SP};

/// Initial stack pointer.
pub const INITIAL_SP: u64 = 0x7FFF_FFFC;
/// Initial global pointer.
pub const INITIAL_GP: u64 = 0x1000_8000;

/// Integer register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gpr {
    regs: [u64; NUM_REGS],
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpr {
    /// Creates the register file with `$sp` and `$gp` at their initial values
    /// and every other register zero.
    pub fn new() -> Self {
        let mut regs = [0; NUM_REGS];
        regs[REG_SP] = INITIAL_SP;
        regs[REG_GP] = INITIAL_GP;
        Self { regs }
    }

    /// Reads a register. `$zero` always reads 0.
    #[inline]
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 0 { 0 } else { self.regs[idx] }
    }

    /// Writes a register. Writes to `$zero` are ignored.
    #[inline]
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Formats every register as `name=value`, four per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, chunk) in self.regs.chunks(4).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(j, v)| format!("{:>5}={:#018x}", INT_NAMES[i * 4 + j], v))
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}
