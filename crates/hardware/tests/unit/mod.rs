//! # Unit Components
//!
//! Tests organised by the component they exercise.

/// Configuration loading, defaults and validation.
pub mod config;

/// Pipeline structures, functional units and the engine.
pub mod core;

/// Instruction parsing and derived fields.
pub mod isa;

/// Whole-program simulation.
pub mod sim;

/// Statistics reporting.
pub mod stats;
