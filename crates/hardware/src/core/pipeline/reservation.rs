//! Reservation station pool (Tomasulo-style dynamic scheduler).
//!
//! Issued instructions wait here until every operand is available. The pool
//! provides:
//! 1. **Issue:** Claims a free entry and builds one operand slot per source
//!    register and literal.
//! 2. **Broadcast:** [`ReservationStations::update`] delivers completed results
//!    to every waiting slot, modelling the common data bus.
//! 3. **Wakeup:** [`ReservationStations::poll_ready`] resolves remaining
//!    operands through the bypass network, then the operand source, and
//!    releases entries whose operands are all ready.
//! 4. **Recovery:** Entries younger than a mispredicted branch are discarded.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::common::error::{CapacityError, Rejected};
use crate::common::reg::RegisterFile;
use crate::core::pipeline::forwarding::{ForwardingUnit, Stage};
use crate::isa::abi::Reg;
use crate::isa::instruction::{InstId, Instruction, Status};

/// Index of a reservation station entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotId(pub usize);

/// Where an operand's value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Architectural register file.
    RegisterFile,
    /// Same-cycle bypass network.
    Forwarded,
    /// Result broadcast by a completing producer.
    Broadcast,
    /// Literal operand.
    Immediate,
    /// Completed but uncommitted result held in the reorder buffer.
    ReorderBuffer,
}

/// Which producer an operand slot accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Awaiting {
    /// Any older writer of the register; falls back to the register file.
    Any,
    /// Only this in-flight instruction.
    Producer(InstId),
    /// No writer was in flight at issue; the register file is current.
    Committed,
}

/// Reports the in-flight writer of a register at issue time.
pub trait ProducerLookup {
    /// The producer an operand reading `reg` must wait for.
    fn awaiting(&self, reg: Reg) -> Awaiting;
}

/// A lookup that knows of no in-flight writers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProducers;

impl ProducerLookup for NoProducers {
    fn awaiting(&self, _reg: Reg) -> Awaiting {
        Awaiting::Any
    }
}

/// Values available to resolve operands outside the bypass network.
pub trait OperandSource {
    /// Architectural value of `reg`.
    fn committed(&self, reg: Reg) -> u64;

    /// Value written to `reg` by `producer`, if it is available.
    fn produced(&self, reg: Reg, producer: InstId) -> Option<(u64, Provenance)>;
}

impl OperandSource for RegisterFile {
    fn committed(&self, reg: Reg) -> u64 {
        self.read(reg)
    }

    fn produced(&self, _reg: Reg, _producer: InstId) -> Option<(u64, Provenance)> {
        None
    }
}

/// One operand of a waiting instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperandSlot {
    /// Source register, or `None` for a literal.
    pub register: Option<Reg>,
    /// Value once known.
    pub value: Option<u64>,
    /// Whether `value` may be consumed.
    pub ready: bool,
    /// Origin of `value`.
    pub provenance: Option<Provenance>,
    /// Producer the slot waits for.
    pub awaiting: Awaiting,
}

impl OperandSlot {
    const fn literal(value: u64) -> Self {
        Self {
            register: None,
            value: Some(value),
            ready: true,
            provenance: Some(Provenance::Immediate),
            awaiting: Awaiting::Any,
        }
    }

    const fn register(reg: Reg, awaiting: Awaiting) -> Self {
        if reg.is_zero() {
            return Self {
                register: Some(reg),
                value: Some(0),
                ready: true,
                provenance: Some(Provenance::RegisterFile),
                awaiting,
            };
        }
        Self {
            register: Some(reg),
            value: None,
            ready: false,
            provenance: None,
            awaiting,
        }
    }

    fn fill(&mut self, value: u64, provenance: Provenance) {
        self.value = Some(value);
        self.ready = true;
        self.provenance = Some(provenance);
    }
}

/// A reservation station entry.
#[derive(Clone, Debug)]
pub struct RsEntry {
    /// Entry index.
    pub slot: SlotId,
    /// Waiting instruction; present exactly when `busy`.
    pub instruction: Option<Instruction>,
    /// Operand slots in source order followed by literals.
    pub operands: Vec<OperandSlot>,
    /// Whether the entry is occupied.
    pub busy: bool,
    /// Pool cycle at which the instruction was issued.
    pub issue_cycle: u64,
}

impl RsEntry {
    const fn new(slot: SlotId) -> Self {
        Self {
            slot,
            instruction: None,
            operands: Vec::new(),
            busy: false,
            issue_cycle: 0,
        }
    }

    fn clear(&mut self) -> Option<Instruction> {
        self.busy = false;
        self.operands.clear();
        self.instruction.take()
    }

    fn all_ready(&self) -> bool {
        self.operands.iter().all(|s| s.ready)
    }

    fn id(&self) -> Option<InstId> {
        self.instruction.as_ref().map(|i| i.id)
    }
}

/// Pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RsStats {
    /// Instructions accepted.
    pub issued: u64,
    /// Instructions released as ready.
    pub released: u64,
    /// Issues refused because every entry was busy.
    pub full: u64,
    /// Operands captured from result broadcasts.
    pub captured: u64,
    /// Entries discarded by recovery.
    pub flushed: u64,
    /// Sum of occupied entries over sampled cycles.
    pub occupancy_sum: u64,
    /// Highest occupancy seen.
    pub peak: usize,
    /// Cycles sampled.
    pub cycles: u64,
}

/// Fixed-size pool of reservation stations.
#[derive(Clone, Debug)]
pub struct ReservationStations {
    entries: Vec<RsEntry>,
    cycle: u64,
    stats: RsStats,
}

impl ReservationStations {
    /// Creates a pool of `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|i| RsEntry::new(SlotId(i))).collect(),
            cycle: 0,
            stats: RsStats::default(),
        }
    }

    /// Number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of occupied entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.busy).count()
    }

    /// Returns true if no entry is occupied.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| !e.busy)
    }

    /// Returns true if every entry is occupied.
    pub fn is_full(&self) -> bool {
        self.entries.iter().all(|e| e.busy)
    }

    /// Counters.
    pub const fn stats(&self) -> &RsStats {
        &self.stats
    }

    /// All entries, occupied or not.
    pub fn entries(&self) -> &[RsEntry] {
        &self.entries
    }

    /// The entry at `slot`.
    pub fn entry(&self, slot: SlotId) -> Option<&RsEntry> {
        self.entries.get(slot.0)
    }

    /// Returns true if instruction `id` is waiting in the pool.
    pub fn contains(&self, id: InstId) -> bool {
        self.entries.iter().any(|e| e.id() == Some(id))
    }

    /// Returns true if a waiting instruction older than `id` satisfies `pred`.
    pub fn any_older(&self, id: InstId, pred: impl Fn(&Instruction) -> bool) -> bool {
        self.entries
            .iter()
            .filter_map(|e| e.instruction.as_ref())
            .any(|inst| inst.id < id && pred(inst))
    }

    /// `(register, reader)` pairs for every waiting source register.
    pub fn pending_reads(&self) -> Vec<(Reg, InstId)> {
        self.entries
            .iter()
            .filter_map(|e| e.instruction.as_ref())
            .flat_map(|inst| inst.sources().into_iter().map(move |r| (r, inst.id)))
            .collect()
    }

    /// Issues with no producer information: register operands accept any
    /// older writer and fall back to the register file.
    ///
    /// This does not wait for writers already in flight. An operand with no
    /// matching broadcast reads the register file on the first poll, so a
    /// value that an uncommitted instruction is still computing is missed.
    /// Use it only when no writer of the operands is in flight; otherwise
    /// issue through [`Self::issue_with`] with the scoreboard.
    ///
    /// # Errors
    ///
    /// Returns the instruction with [`CapacityError::NoFreeReservationStation`]
    /// when every entry is busy.
    pub fn issue(&mut self, instruction: Instruction) -> Result<SlotId, Rejected<CapacityError>> {
        self.issue_with(instruction, &NoProducers)
    }

    /// Issues into the first free entry, recording for each register operand
    /// the producer reported by `producers`.
    ///
    /// Must be called before the instruction claims its own destination, so
    /// that an instruction reading and writing the same register waits for
    /// the previous writer.
    ///
    /// # Errors
    ///
    /// Returns the instruction with [`CapacityError::NoFreeReservationStation`]
    /// when every entry is busy.
    pub fn issue_with(
        &mut self,
        mut instruction: Instruction,
        producers: &(impl ProducerLookup + ?Sized),
    ) -> Result<SlotId, Rejected<CapacityError>> {
        debug_assert!(
            !self.contains(instruction.id),
            "{} issued twice",
            instruction.id
        );
        let Some(entry) = self.entries.iter_mut().find(|e| !e.busy) else {
            self.stats.full += 1;
            return Err(Rejected::new(
                instruction,
                CapacityError::NoFreeReservationStation,
            ));
        };

        let mut operands: Vec<OperandSlot> = instruction
            .sources()
            .into_iter()
            .map(|r| OperandSlot::register(r, producers.awaiting(r)))
            .collect();
        operands.extend(instruction.immediates().map(|v| OperandSlot::literal(v as u64)));
        if let Ok((offset, _)) = instruction.mem_operand() {
            operands.push(OperandSlot::literal(offset as u64));
        }

        instruction.status = Status::Issued;
        let _ = instruction.issue_cycle.get_or_insert(self.cycle);
        tracing::debug!(
            id = %instruction.id,
            slot = entry.slot.0,
            inst = %instruction,
            "rs issue"
        );

        entry.operands = operands;
        entry.issue_cycle = self.cycle;
        entry.instruction = Some(instruction);
        entry.busy = true;
        self.stats.issued += 1;
        Ok(entry.slot)
    }

    /// Broadcasts completed results to waiting operands.
    ///
    /// A slot takes a value when the completed instruction writes its register
    /// and is a producer the slot accepts. When several completions write the
    /// same register, the later one in `completed` wins. Returns the number of
    /// operands captured.
    pub fn update(&mut self, completed: &[(Instruction, u64)]) -> usize {
        let mut captured = 0;
        for entry in self.entries.iter_mut().filter(|e| e.busy) {
            let Some(consumer) = entry.id() else {
                continue;
            };
            for slot in entry.operands.iter_mut().filter(|s| !s.ready) {
                let Some(reg) = slot.register else {
                    continue;
                };
                let hit = completed.iter().rev().find(|(producer, _)| {
                    producer.destination() == Some(reg)
                        && accepts(slot.awaiting, producer.id, consumer)
                });
                if let Some((_, value)) = hit {
                    slot.fill(*value, Provenance::Broadcast);
                    captured += 1;
                }
            }
        }
        self.stats.captured += captured as u64;
        captured
    }

    /// Releases every instruction whose operands are all ready, oldest first.
    pub fn poll_ready(
        &mut self,
        source: &(impl OperandSource + ?Sized),
        forwarding: &mut ForwardingUnit,
    ) -> Vec<Instruction> {
        self.poll_ready_admitting(source, forwarding, |_| true)
    }

    /// Like [`Self::poll_ready`], but each ready instruction is offered to
    /// `admit` first; refused instructions stay with their operands resolved.
    pub fn poll_ready_admitting(
        &mut self,
        source: &(impl OperandSource + ?Sized),
        forwarding: &mut ForwardingUnit,
        mut admit: impl FnMut(&Instruction) -> bool,
    ) -> Vec<Instruction> {
        let mut order: Vec<(InstId, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.id().map(|id| (id, i)))
            .collect();
        order.sort_unstable();

        let mut ready = Vec::new();
        for (_, idx) in order {
            let entry = &mut self.entries[idx];
            resolve(entry, source, forwarding);
            if !entry.all_ready() {
                continue;
            }
            let admitted = entry.instruction.as_ref().is_some_and(&mut admit);
            if !admitted {
                continue;
            }
            let resolved: BTreeMap<Reg, u64> = entry
                .operands
                .iter()
                .filter_map(|s| Some((s.register?, s.value?)))
                .collect();
            if let Some(mut inst) = entry.clear() {
                inst.resolved = resolved;
                tracing::debug!(id = %inst.id, slot = idx, "rs ready");
                self.stats.released += 1;
                ready.push(inst);
            }
        }
        ready
    }

    /// Discards every entry younger than `id`; returns how many were dropped.
    pub fn flush_younger(&mut self, id: InstId) -> usize {
        let mut dropped = 0;
        for entry in &mut self.entries {
            if entry.id().is_some_and(|e| e > id) {
                let _ = entry.clear();
                dropped += 1;
            }
        }
        self.stats.flushed += dropped as u64;
        dropped
    }

    /// Samples occupancy and advances the pool cycle.
    pub fn end_cycle(&mut self) {
        let occupied = self.len();
        self.stats.occupancy_sum += occupied as u64;
        self.stats.peak = self.stats.peak.max(occupied);
        self.stats.cycles += 1;
        self.cycle += 1;
    }

    /// Mean occupied entries per sampled cycle.
    pub fn average_occupancy(&self) -> f64 {
        if self.stats.cycles == 0 {
            0.0
        } else {
            self.stats.occupancy_sum as f64 / self.stats.cycles as f64
        }
    }

    /// Empties every entry and zeroes the counters.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            let _ = entry.clear();
        }
        self.cycle = 0;
        self.stats = RsStats::default();
        tracing::info!(capacity = self.entries.len(), "reservation stations reset");
    }
}

fn accepts(awaiting: Awaiting, producer: InstId, consumer: InstId) -> bool {
    match awaiting {
        Awaiting::Any => producer < consumer,
        Awaiting::Producer(id) => id == producer,
        Awaiting::Committed => false,
    }
}

fn resolve(
    entry: &mut RsEntry,
    source: &(impl OperandSource + ?Sized),
    forwarding: &mut ForwardingUnit,
) {
    let RsEntry {
        instruction: Some(inst),
        operands,
        ..
    } = entry
    else {
        return;
    };
    if operands.iter().all(|s| s.ready) {
        return;
    }
    let forwarded = forwarding.get_forwarded_values(inst, Stage::Issue);

    for slot in operands.iter_mut().filter(|s| !s.ready) {
        let Some(reg) = slot.register else {
            continue;
        };
        let bypass = forwarded
            .iter()
            .find(|fv| fv.register == reg && accepts_forward(slot.awaiting, fv.producer));
        if let Some(fv) = bypass {
            slot.fill(fv.value, Provenance::Forwarded);
            continue;
        }
        match slot.awaiting {
            Awaiting::Any | Awaiting::Committed => {
                slot.fill(source.committed(reg), Provenance::RegisterFile);
            }
            Awaiting::Producer(id) => {
                if let Some((value, provenance)) = source.produced(reg, id) {
                    slot.fill(value, provenance);
                }
            }
        }
    }
}

fn accepts_forward(awaiting: Awaiting, producer: InstId) -> bool {
    match awaiting {
        Awaiting::Any => true,
        Awaiting::Producer(id) => id == producer,
        Awaiting::Committed => false,
    }
}
