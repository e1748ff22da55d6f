//! Memory system: data cache, main memory and store buffer.
//!
//! Loads check the store buffer first, then the cache; a miss charges the
//! configured penalty and reads main memory. Stores are held in the store
//! buffer from issue until they commit and drain.

use serde::Serialize;

use crate::common::error::ExecutionError;
use crate::config::Config;
use crate::core::pipeline::store_buffer::{ForwardResult, StoreBuffer};
use crate::core::units::cache::DataCache;
use crate::isa::instruction::InstId;
use crate::isa::opcode::MemWidth;
use crate::soc::memory::Memory;
use crate::soc::traits::{AccessOutcome, DataPort, LoadResult};

/// Memory traffic counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Loads performed.
    pub loads: u64,
    /// Stores resolved.
    pub stores: u64,
    /// Loads satisfied entirely from the store buffer.
    pub forwarded_loads: u64,
    /// Loads that took some bytes from the store buffer.
    pub partial_forwards: u64,
    /// Stores written to memory.
    pub drained: u64,
}

/// Cache, main memory and store buffer.
#[derive(Debug)]
pub struct MemorySystem {
    cache: DataCache,
    memory: Memory,
    store_buffer: StoreBuffer,
    miss_penalty: u32,
    stats: MemoryStats,
}

impl MemorySystem {
    /// Builds the memory system described by `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            cache: DataCache::new(&config.cache),
            memory: Memory::new(config.memory.size),
            store_buffer: StoreBuffer::new(config.pipeline.store_buffer_size),
            miss_penalty: config.cache.miss_penalty,
            stats: MemoryStats::default(),
        }
    }

    /// Main memory.
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Main memory, mutably, for program setup.
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// The data cache.
    pub const fn cache(&self) -> &DataCache {
        &self.cache
    }

    /// The store buffer.
    pub const fn store_buffer(&self) -> &StoreBuffer {
        &self.store_buffer
    }

    /// Counters.
    pub const fn stats(&self) -> &MemoryStats {
        &self.stats
    }

    /// Reserves a store buffer slot for a store entering the pipeline.
    /// Returns false when the buffer is full.
    pub fn allocate_store(&mut self, inst: InstId, width: MemWidth) -> bool {
        self.store_buffer.allocate(inst, width)
    }

    /// Marks store `inst` as retired.
    pub fn commit_store(&mut self, inst: InstId) {
        self.store_buffer.mark_committed(inst);
    }

    /// Writes the oldest retired store to the cache and memory.
    ///
    /// Returns the written address, or `None` when nothing is ready to drain.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MemoryOutOfBounds`] for a store outside
    /// memory; such a store is dropped.
    pub fn drain_one(&mut self) -> Result<Option<u64>, ExecutionError> {
        let Some(entry) = self.store_buffer.drain_one() else {
            return Ok(None);
        };
        let Some(addr) = entry.addr else {
            return Ok(None);
        };
        let _ = self.cache.access(addr);
        self.memory.write(addr, entry.width, entry.data)?;
        self.stats.drained += 1;
        tracing::debug!(inst = %entry.inst_id, addr, data = entry.data, "store drained");
        Ok(Some(addr))
    }

    /// Discards stores younger than `inst`.
    pub fn squash_after(&mut self, inst: InstId) {
        self.store_buffer.flush_after(inst);
    }

    /// Discards every store that has not committed.
    pub fn squash_uncommitted(&mut self) {
        self.store_buffer.flush_uncommitted();
    }

    /// Returns true if no store is waiting to reach memory.
    pub fn is_drained(&self) -> bool {
        self.store_buffer.is_empty()
    }
}

impl DataPort for MemorySystem {
    fn load(
        &mut self,
        inst: InstId,
        addr: u64,
        width: MemWidth,
    ) -> Result<LoadResult, ExecutionError> {
        self.memory.check(addr, width)?;
        self.stats.loads += 1;

        let forwarded = self.store_buffer.forward_load(addr, width, inst);
        if let ForwardResult::Hit(value) = forwarded {
            self.stats.forwarded_loads += 1;
            return Ok(LoadResult {
                value,
                outcome: AccessOutcome::Forwarded,
                penalty: 0,
            });
        }
        if matches!(forwarded, ForwardResult::Partial { .. }) {
            self.stats.partial_forwards += 1;
        }

        let hit = self.cache.access(addr);
        let raw = self.memory.read(addr, width)?;
        Ok(LoadResult {
            value: forwarded.merge(raw),
            outcome: if hit {
                AccessOutcome::Hit
            } else {
                AccessOutcome::Miss
            },
            penalty: if hit { 0 } else { self.miss_penalty },
        })
    }

    fn store(
        &mut self,
        inst: InstId,
        addr: u64,
        width: MemWidth,
        value: u64,
    ) -> Result<(), ExecutionError> {
        self.memory.check(addr, width)?;
        self.store_buffer.resolve(inst, addr, value);
        self.stats.stores += 1;
        Ok(())
    }
}
