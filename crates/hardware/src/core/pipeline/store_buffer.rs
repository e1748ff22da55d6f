//! Store buffer between the load/store unit and main memory.
//!
//! A store claims an entry at issue, learns its address and data when the LSU
//! executes it, and may only reach memory after the reorder buffer retires
//! it. Entries leave in program order, one per drain. While a store waits,
//! younger loads read the bytes it covers straight from the buffer.

use std::collections::VecDeque;

use crate::isa::instruction::InstId;
use crate::isa::opcode::MemWidth;

/// Result of a store-to-load forwarding check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardResult {
    /// Older stores cover every byte of the load.
    Hit(u64),
    /// No older store overlaps the load.
    Miss,
    /// Some bytes come from older stores; `mask` has `0xFF` in each byte
    /// lane supplied by `data`. The remaining lanes must be read from memory.
    Partial {
        /// Forwarded bytes in their lanes.
        data: u64,
        /// Lanes present in `data`.
        mask: u64,
    },
}

impl ForwardResult {
    /// Merges the forwarded bytes over `memory`, the value read from memory.
    pub const fn merge(self, memory: u64) -> u64 {
        match self {
            Self::Hit(v) => v,
            Self::Miss => memory,
            Self::Partial { data, mask } => (data & mask) | (memory & !mask),
        }
    }
}

/// Where a buffered store is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreState {
    /// Issued; address and data unknown.
    #[default]
    Pending,
    /// Executed; waiting to retire.
    Ready,
    /// Retired; may drain.
    Committed,
}

/// One buffered store.
#[derive(Clone, Debug, Default)]
pub struct StoreBufferEntry {
    /// Store instruction.
    pub inst_id: InstId,
    /// Effective address, once resolved.
    pub addr: Option<u64>,
    /// Value in the low `width` bytes.
    pub data: u64,
    /// Access width.
    pub width: MemWidth,
    /// Lifecycle state.
    pub state: StoreState,
}

impl StoreBufferEntry {
    fn byte_at(&self, addr: u64) -> Option<u8> {
        let offset = addr.checked_sub(self.addr?)?;
        (offset < self.width.bytes() as u64).then(|| (self.data >> (offset * 8)) as u8)
    }
}

/// Bounded program-order queue of stores.
#[derive(Clone, Debug)]
pub struct StoreBuffer {
    entries: VecDeque<StoreBufferEntry>,
    capacity: usize,
}

impl StoreBuffer {
    /// Creates an empty buffer holding at most `capacity` stores.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of stores.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no store is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if no further store can be allocated.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Entries still available.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.entries.len())
    }

    /// Appends store `inst_id`. Returns false when the buffer is full.
    pub fn allocate(&mut self, inst_id: InstId, width: MemWidth) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push_back(StoreBufferEntry {
            inst_id,
            width,
            ..StoreBufferEntry::default()
        });
        true
    }

    /// Records a store's address and data once it executes.
    pub fn resolve(&mut self, inst_id: InstId, addr: u64, data: u64) {
        if let Some(entry) = self.find_mut(inst_id) {
            entry.addr = Some(addr);
            entry.data = data;
            entry.state = StoreState::Ready;
        }
    }

    /// Marks a resolved store as retired.
    pub fn mark_committed(&mut self, inst_id: InstId) {
        if let Some(entry) = self.find_mut(inst_id)
            && entry.state == StoreState::Ready
        {
            entry.state = StoreState::Committed;
        }
    }

    /// Store-to-load forwarding for a load with sequence number `load`.
    ///
    /// Each byte of the load is taken from the youngest store older than
    /// `load` that wrote it.
    pub fn forward_load(&self, addr: u64, width: MemWidth, load: InstId) -> ForwardResult {
        let mut data = 0u64;
        let mut mask = 0u64;
        for byte in 0..width.bytes() {
            let a = addr.wrapping_add(byte as u64);
            let hit = self
                .entries
                .iter()
                .rev()
                .filter(|e| e.inst_id < load)
                .find_map(|e| e.byte_at(a));
            if let Some(b) = hit {
                let shift = byte * 8;
                data |= u64::from(b) << shift;
                mask |= 0xFF << shift;
            }
        }

        let full = if width.bytes() >= 8 {
            u64::MAX
        } else {
            (1u64 << (width.bytes() * 8)) - 1
        };
        match mask {
            0 => ForwardResult::Miss,
            m if m == full => ForwardResult::Hit(data),
            _ => ForwardResult::Partial { data, mask },
        }
    }

    /// Removes the oldest store if it has retired.
    pub fn drain_one(&mut self) -> Option<StoreBufferEntry> {
        if self.entries.front()?.state != StoreState::Committed {
            return None;
        }
        self.entries.pop_front()
    }

    /// Drops stores younger than `keep`.
    pub fn flush_after(&mut self, keep: InstId) {
        self.entries.retain(|e| e.inst_id <= keep);
    }

    /// Drops every store that has not retired.
    pub fn flush_uncommitted(&mut self) {
        self.entries.retain(|e| e.state == StoreState::Committed);
    }

    /// Drops everything, retired stores included.
    pub fn flush_all(&mut self) {
        self.entries.clear();
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &StoreBufferEntry> {
        self.entries.iter()
    }

    fn find_mut(&mut self, inst_id: InstId) -> Option<&mut StoreBufferEntry> {
        self.entries.iter_mut().find(|e| e.inst_id == inst_id)
    }
}
