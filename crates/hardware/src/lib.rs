//! Superscalar pipeline simulator library.
//!
//! This crate implements a cycle-stepped out-of-order processor model with the following:
//! 1. **Core:** Tomasulo reservation stations, a scoreboard, a bypass network, a
//!    reorder buffer and multi-latency ALU/FPU/LSU functional units.
//! 2. **Memory:** Set-associative LRU data cache, store buffer and flat main memory.
//! 3. **ISA:** A small MIPS-flavoured instruction set with an assembly parser.
//! 4. **Prediction:** Always-taken, bimodal and gshare predictors with a BTB.
//! 5. **Simulation:** Program loader, fetch unit, configuration and statistics.
//!
//! # Examples
//!
//! ```
//! use sspsim_core::{Config, Program, Simulator};
//!
//! let program = Program::parse("ADDI $t0, $zero, 7\nADDI $t1, $t0, 1\n").unwrap();
//! let mut sim = Simulator::new(&Config::default(), program).unwrap();
//! let summary = sim.run();
//! assert_eq!(summary.retired, 2);
//! assert_eq!(sim.engine().regs().read_register("$t1").unwrap(), 8);
//! ```

/// Common types (register file, error taxonomy).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures, validation).
pub mod config;
/// Execution core (pipeline structures, engine, functional units).
pub mod core;
/// Instruction set (opcodes, instruction record, register names, parser).
pub mod isa;
/// Program loading, fetch and the simulation loop.
pub mod sim;
/// Memory system (main memory, cache/store-buffer data port).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Out-of-order execution engine; one `tick` per cycle.
pub use crate::core::Engine;
/// Parsed assembly program.
pub use crate::sim::Program;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// Statistics snapshot.
pub use crate::stats::SimStats;
