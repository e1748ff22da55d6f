//! Fetch/decode front end.
//!
//! Each cycle the fetch unit reads up to `fetch_width` instructions along the
//! predicted path into a bounded queue that the engine issues from. Every
//! fetched instruction gets the next [`InstId`]; branches and jumps carry the
//! address fetch continued at so the engine can detect a misprediction.

use std::collections::VecDeque;

use crate::config::PipelineConfig;
use crate::core::units::bru::BranchUnit;
use crate::isa::instruction::{InstId, Instruction, Status};
use crate::sim::loader::Program;

/// Front-end counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Instructions fetched, including wrong-path ones.
    pub fetched: u64,
    /// Redirects received from the engine.
    pub redirects: u64,
    /// Cycles fetch was blocked by a full queue.
    pub queue_full: u64,
}

/// Program counter, sequence numbering and the fetch queue.
#[derive(Debug)]
pub struct FetchUnit {
    pc: u64,
    next_id: u64,
    width: usize,
    capacity: usize,
    queue: VecDeque<Instruction>,
    stats: FetchStats,
}

impl FetchUnit {
    /// Creates a fetch unit starting at address 0.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            pc: 0,
            next_id: 0,
            width: config.fetch_width,
            capacity: config.fetch_queue_size,
            queue: VecDeque::with_capacity(config.fetch_queue_size),
            stats: FetchStats::default(),
        }
    }

    /// Next address to fetch.
    pub const fn pc(&self) -> u64 {
        self.pc
    }

    /// Counters.
    pub const fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Decoded instructions waiting for issue, oldest first.
    pub const fn queue(&self) -> &VecDeque<Instruction> {
        &self.queue
    }

    /// The queue, for the engine to issue from.
    pub const fn queue_mut(&mut self) -> &mut VecDeque<Instruction> {
        &mut self.queue
    }

    /// Fetches and decodes up to `fetch_width` instructions. Returns how many
    /// entered the queue.
    pub fn fetch(&mut self, program: &Program, branch: &mut BranchUnit) -> usize {
        let room = self.capacity.saturating_sub(self.queue.len());
        if room == 0 {
            self.stats.queue_full += 1;
            return 0;
        }
        let mut fetched = 0;
        while fetched < self.width.min(room) {
            let Some(line) = program.get(self.pc) else {
                break;
            };
            let mut inst = line.instantiate(InstId(self.next_id));
            self.next_id += 1;
            inst.status = Status::Decoded;

            let next = if inst.opcode.is_control() {
                let next = branch.predict(&inst).unwrap_or_else(|| inst.fallthrough());
                inst.predicted_next = Some(next);
                next
            } else {
                inst.fallthrough()
            };
            tracing::debug!(id = %inst.id, pc = format_args!("{:#x}", inst.pc), inst = %inst, "fetch");
            self.queue.push_back(inst);
            self.pc = next;
            fetched += 1;
        }
        self.stats.fetched += fetched as u64;
        fetched
    }

    /// Restarts fetch at `pc`, discarding anything still queued.
    pub fn redirect(&mut self, pc: u64) {
        self.queue.clear();
        self.pc = pc;
        self.stats.redirects += 1;
        tracing::debug!(pc = format_args!("{pc:#x}"), "fetch redirect");
    }

    /// Returns true when the queue is empty and the program counter has left
    /// the program.
    pub fn is_done(&self, program: &Program) -> bool {
        self.queue.is_empty() && program.get(self.pc).is_none()
    }
}
