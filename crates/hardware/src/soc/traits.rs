//! Data memory port used by the load/store unit.
//!
//! The load/store unit reaches memory only through [`DataPort`], so tests can
//! substitute a mock and the pipeline never depends on the cache or store
//! buffer layout.

use serde::Serialize;

use crate::common::error::ExecutionError;
use crate::isa::instruction::InstId;
use crate::isa::opcode::MemWidth;

/// Where a load found its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    /// Resident in the data cache.
    Hit,
    /// Fetched from main memory.
    Miss,
    /// Supplied entirely by older pending stores.
    Forwarded,
}

/// A completed load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadResult {
    /// Loaded bytes, zero-extended.
    pub value: u64,
    /// Where the data came from.
    pub outcome: AccessOutcome,
    /// Extra cycles charged to the load.
    pub penalty: u32,
}

/// Memory as seen by the load/store unit.
pub trait DataPort {
    /// Reads `width` bytes at `addr` on behalf of load `inst`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MemoryOutOfBounds`] if the access leaves memory.
    fn load(&mut self, inst: InstId, addr: u64, width: MemWidth)
    -> Result<LoadResult, ExecutionError>;

    /// Records the address and data of store `inst`. The write reaches memory
    /// only when the store commits.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MemoryOutOfBounds`] if the access leaves memory.
    fn store(
        &mut self,
        inst: InstId,
        addr: u64,
        width: MemWidth,
        value: u64,
    ) -> Result<(), ExecutionError>;
}
