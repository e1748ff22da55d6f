//! Memory subsystem.
//!
//! This module organizes the components behind the load/store unit:
//! 1. **Memory:** Flat byte-addressed main memory.
//! 2. **System:** Data cache, main memory and store buffer combined behind
//!    the [`DataPort`] trait.

/// Main memory.
pub mod memory;

/// Cache, memory and store buffer behind the data port.
pub mod system;

/// Data port trait used by the load/store unit.
pub mod traits;

pub use memory::Memory;
pub use system::MemorySystem;
pub use traits::{AccessOutcome, DataPort, LoadResult};
