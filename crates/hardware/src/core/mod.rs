//! Core processor implementation.
//!
//! This module contains the execution core: architectural register naming,
//! the out-of-order pipeline and the functional units it schedules onto.

/// Architectural register conventions (integer and floating-point files).
pub mod arch;

/// Out-of-order pipeline (reservation stations, scoreboard, ROB, engine).
pub mod pipeline;

/// Execution units (ALU, FPU, LSU, branch prediction, data cache).
pub mod units;

pub use self::pipeline::Engine;
