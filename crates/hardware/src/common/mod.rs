//! Common types shared across the simulator.
//!
//! 1. **Error Handling:** Execution, capacity, parse and configuration errors.
//! 2. **Register Management:** The unified register file.

/// Error types for execution, capacity, parsing and configuration.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use error::{CapacityError, ConfigError, ExecutionError, ParseError, Rejected, SimError};
pub use reg::RegisterFile;
