//! Architectural register state.
//!
//! 1. **GPRs:** Integer register file with the hardwired `$zero`.
//! 2. **FPRs:** Floating-point register file holding `f64` bit patterns.

/// Floating-point register file implementation.
pub mod fpr;

/// Integer register file implementation.
pub mod gpr;
