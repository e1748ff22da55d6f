//! Simulation driver.
//!
//! 1. **Loader:** Parses assembly text into a [`loader::Program`].
//! 2. **Fetch:** Predicts the path and fills the fetch queue.
//! 3. **Simulator:** Steps fetch and the engine, and collects statistics.

/// Instruction fetch and decode front end.
pub mod fetch;

/// Assembly program loader.
pub mod loader;

/// Top-level simulation loop.
pub mod simulator;

pub use self::loader::Program;
pub use self::simulator::{RunSummary, Simulator, StopReason};
