//! Reorder Buffer (ROB) for in-order commit.
//!
//! The ROB is a circular buffer that tracks in-flight instructions from issue
//! through commit. It provides:
//! 1. **Allocation:** Claims the tail slot when an instruction issues.
//! 2. **Completion:** Takes ownership of the instruction once its unit finishes.
//! 3. **In-order Commit:** Retires ready entries from the head in program order.
//! 4. **Exceptions:** Faulted entries block commit at the head until handled.
//! 5. **Flush:** Squashes speculative entries after a misprediction or fault.

use std::fmt;

use serde::Serialize;

use crate::common::error::{CapacityError, ExecutionError};
use crate::common::reg::RegisterFile;
use crate::isa::abi::Reg;
use crate::isa::instruction::{InstId, Instruction, Status};
use crate::isa::opcode::Opcode;

/// Index of a ROB slot, stable from allocation to commit or flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct RobId(pub usize);

impl fmt::Display for RobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rob{}", self.0)
    }
}

/// A single entry in the Reorder Buffer.
#[derive(Clone, Debug, Default)]
pub struct RobEntry {
    /// Slot index.
    pub id: RobId,
    /// Identity of the instruction occupying the slot.
    pub inst_id: InstId,
    /// Program counter of the instruction.
    pub pc: u64,
    /// Operation, for reporting.
    pub opcode: Option<Opcode>,
    /// Destination register, if any.
    pub destination: Option<Reg>,
    /// The instruction, once its functional unit hands it over.
    pub instruction: Option<Instruction>,
    /// Result available; eligible to commit.
    pub ready: bool,
    /// Execution error; blocks commit at the head.
    pub exception: Option<ExecutionError>,
    /// Computed value.
    pub result: Option<u64>,
    /// Cycle the result arrived.
    pub completion_cycle: Option<u64>,
    /// Whether this entry is valid (occupied).
    pub valid: bool,
}

/// Reorder Buffer: circular buffer for in-order commit.
#[derive(Clone, Debug)]
pub struct ReorderBuffer {
    /// Fixed-size entry array.
    entries: Vec<RobEntry>,
    /// Index of the oldest entry (commit point).
    head: usize,
    /// Index where the next entry will be allocated.
    tail: usize,
    /// Number of valid entries.
    count: usize,
}

impl ReorderBuffer {
    /// Creates a new ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, RobEntry::default);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.id = RobId(i);
        }
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the ROB is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Returns the number of free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.count
    }

    /// Index of the oldest entry.
    #[inline]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Index where the next entry will be allocated.
    #[inline]
    pub const fn tail(&self) -> usize {
        self.tail
    }

    fn next(&self, idx: usize) -> usize {
        (idx + 1) % self.entries.len()
    }

    /// Claims the tail slot for `instruction`.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::ReorderBufferFull`] when occupancy equals
    /// capacity.
    pub fn allocate(&mut self, instruction: &Instruction) -> Result<RobId, CapacityError> {
        if self.is_full() {
            return Err(CapacityError::ReorderBufferFull);
        }
        let id = RobId(self.tail);
        self.entries[self.tail] = RobEntry {
            id,
            inst_id: instruction.id,
            pc: instruction.pc,
            opcode: Some(instruction.opcode),
            destination: instruction.destination(),
            valid: true,
            ..RobEntry::default()
        };
        self.tail = self.next(self.tail);
        self.count += 1;
        tracing::debug!(rob = %id, inst = %instruction.id, "rob allocate");
        Ok(id)
    }

    fn live_mut(&mut self, id: RobId) -> Option<&mut RobEntry> {
        self.entries.get_mut(id.0).filter(|e| e.valid)
    }

    /// Records a completed result. Does not move `head`.
    pub fn mark_ready(&mut self, id: RobId, result: Option<u64>) {
        if let Some(entry) = self.live_mut(id) {
            entry.result = result;
            entry.ready = true;
        }
    }

    /// Hands the finished instruction to its slot and marks it ready.
    pub fn complete(&mut self, id: RobId, mut instruction: Instruction) {
        let Some(entry) = self.live_mut(id) else {
            tracing::warn!(rob = %id, inst = %instruction.id, "completion for empty slot dropped");
            return;
        };
        debug_assert_eq!(entry.inst_id, instruction.id, "completion routed to wrong slot");
        instruction.status = Status::WriteBack;
        entry.result = instruction.result;
        entry.completion_cycle = instruction.completion_cycle;
        entry.instruction = Some(instruction);
        entry.ready = true;
    }

    /// Marks the slot faulted; the entry blocks commit when it reaches the head.
    pub fn fault(&mut self, id: RobId, mut instruction: Instruction, error: ExecutionError) {
        if let Some(entry) = self.live_mut(id) {
            instruction.status = Status::Failed;
            entry.instruction = Some(instruction);
            entry.exception = Some(error);
            entry.ready = true;
        }
    }

    /// Returns a reference to the head entry (oldest), if the ROB is non-empty.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// The exception blocking the head, if any.
    pub fn pending_exception(&self) -> Option<&ExecutionError> {
        self.peek_head().and_then(|e| e.exception.as_ref())
    }

    /// Removes and returns a faulted head entry.
    pub fn take_exception(&mut self) -> Option<RobEntry> {
        self.pending_exception()?;
        Some(self.pop_head())
    }

    fn pop_head(&mut self) -> RobEntry {
        let entry = std::mem::take(&mut self.entries[self.head]);
        self.entries[self.head].id = entry.id;
        self.head = self.next(self.head);
        self.count -= 1;
        entry
    }

    /// Retires every ready entry from the head.
    ///
    /// Entries with a destination and a result write `regs`. Stops at the
    /// first entry that is not ready or carries an exception.
    pub fn commit(&mut self, regs: &mut RegisterFile) -> Vec<RobEntry> {
        self.commit_limited(regs, usize::MAX)
    }

    /// Like [`Self::commit`], retiring at most `max` entries.
    pub fn commit_limited(&mut self, regs: &mut RegisterFile, max: usize) -> Vec<RobEntry> {
        let mut retired = Vec::new();
        while retired.len() < max {
            match self.peek_head() {
                Some(head) if head.ready && head.exception.is_none() => {}
                _ => break,
            }
            let mut entry = self.pop_head();
            if let (Some(reg), Some(value)) = (entry.destination, entry.result) {
                regs.write(reg, value);
            }
            if let Some(inst) = entry.instruction.as_mut() {
                inst.status = Status::Committed;
            }
            tracing::debug!(rob = %entry.id, inst = %entry.inst_id, "rob commit");
            retired.push(entry);
        }
        retired
    }

    /// Clears every entry from `start` up to the tail and sets `tail = start`.
    ///
    /// Does nothing unless `start` names a live entry. Returns the cleared
    /// entries, oldest first.
    pub fn flush(&mut self, start: RobId) -> Vec<RobEntry> {
        let len = self.entries.len();
        if start.0 >= len || self.count == 0 {
            return Vec::new();
        }
        let offset = (start.0 + len - self.head) % len;
        if offset >= self.count {
            return Vec::new();
        }
        let doomed = self.count - offset;
        let mut cleared = Vec::with_capacity(doomed);
        let mut idx = start.0;
        for _ in 0..doomed {
            let entry = std::mem::take(&mut self.entries[idx]);
            self.entries[idx].id = RobId(idx);
            cleared.push(entry);
            idx = self.next(idx);
        }
        self.tail = start.0;
        self.count = offset;
        tracing::debug!(from = %start, cleared = cleared.len(), "rob flush");
        cleared
    }

    /// Clears every entry younger than instruction `id`, keeping `id` itself.
    pub fn flush_after(&mut self, id: InstId) -> Vec<RobEntry> {
        let first_younger = self.iter().find(|e| e.inst_id > id).map(|e| e.id);
        first_younger.map_or_else(Vec::new, |start| self.flush(start))
    }

    /// Empties the buffer.
    pub fn flush_all(&mut self) -> Vec<RobEntry> {
        if self.count == 0 {
            return Vec::new();
        }
        self.flush(RobId(self.head))
    }

    /// Finds the live entry holding instruction `id`.
    pub fn find(&self, id: InstId) -> Option<&RobEntry> {
        self.iter().find(|e| e.inst_id == id)
    }

    /// The live entry at `id`.
    pub fn get(&self, id: RobId) -> Option<&RobEntry> {
        self.entries.get(id.0).filter(|e| e.valid)
    }

    /// Live entries from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &RobEntry> {
        let len = self.entries.len();
        (0..self.count).map(move |i| &self.entries[(self.head + i) % len])
    }
}
