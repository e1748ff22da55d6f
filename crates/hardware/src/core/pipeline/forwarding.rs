//! Data forwarding (bypass) network.
//!
//! Results published by a producing stage can be consumed in the same cycle by
//! an instruction waiting in an earlier stage, without going through the
//! register file. The unit provides:
//! 1. **Paths:** Static `(from, to, condition, priority)` routes, searched in
//!    descending priority.
//! 2. **Per-cycle tables:** Values published this cycle, discarded by
//!    [`ForwardingUnit::clear_cycle_data`].
//! 3. **History:** The last few values per register, kept for inspection.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::ForwardingConfig;
use crate::isa::abi::Reg;
use crate::isa::instruction::{InstId, Instruction};

/// Values retained per register in the history.
pub const HISTORY_DEPTH: usize = 5;

/// Pipeline stage, ordered from front to back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Instruction fetch.
    Fetch,
    /// Decode.
    Decode,
    /// Reservation-station wait.
    Issue,
    /// Functional-unit execution.
    Execute,
    /// Data memory access.
    Memory,
    /// Result write back and commit.
    Writeback,
}

impl Stage {
    /// Lower-case stage name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Decode => "decode",
            Self::Issue => "issue",
            Self::Execute => "execute",
            Self::Memory => "memory",
            Self::Writeback => "writeback",
        }
    }
}

/// Predicate deciding whether a path may feed a given consumer.
pub type PathCondition = fn(&Instruction) -> bool;

const fn any_consumer(_: &Instruction) -> bool {
    true
}

/// A bypass route.
#[derive(Clone, Copy, Debug)]
pub struct ForwardingPath {
    /// Producing stage.
    pub from: Stage,
    /// Consuming stage.
    pub to: Stage,
    /// Consumer predicate.
    pub condition: PathCondition,
    /// Higher values are searched first.
    pub priority: u8,
}

impl ForwardingPath {
    /// A path that accepts every consumer.
    pub const fn new(from: Stage, to: Stage, priority: u8) -> Self {
        Self {
            from,
            to,
            condition: any_consumer,
            priority,
        }
    }

    /// Restricts the path to consumers matching `condition`.
    #[must_use]
    pub const fn when(mut self, condition: PathCondition) -> Self {
        self.condition = condition;
        self
    }
}

/// A value published on the bypass network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ForwardedValue {
    /// Instruction that produced the value.
    pub producer: InstId,
    /// Register the value is destined for.
    pub register: Reg,
    /// The value.
    pub value: u64,
    /// Stage that published it.
    pub stage: Stage,
    /// Forwarding-unit cycle of publication.
    pub cycle: u64,
}

/// Bypass network counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ForwardingStats {
    /// Values published.
    pub published: u64,
    /// Operand lookups satisfied by a path.
    pub hits: u64,
    /// Operand lookups with no live value.
    pub misses: u64,
    /// Lookups where several same-priority candidates competed.
    pub conflicts: u64,
}

/// The bypass network.
#[derive(Clone, Debug, Default)]
pub struct ForwardingUnit {
    paths: Vec<ForwardingPath>,
    live: Vec<ForwardedValue>,
    history: BTreeMap<Reg, VecDeque<ForwardedValue>>,
    cycle: u64,
    stats: ForwardingStats,
}

impl ForwardingUnit {
    /// Creates a unit with the given paths.
    pub fn new(paths: Vec<ForwardingPath>) -> Self {
        let mut unit = Self::default();
        for path in paths {
            unit.add_path(path);
        }
        unit
    }

    /// Execute, memory and writeback each forwarding to issue, in that
    /// priority order.
    pub fn with_default_paths() -> Self {
        Self::new(vec![
            ForwardingPath::new(Stage::Execute, Stage::Issue, 3),
            ForwardingPath::new(Stage::Memory, Stage::Issue, 2),
            ForwardingPath::new(Stage::Writeback, Stage::Issue, 1),
        ])
    }

    /// Builds the network described by `config`; empty when disabled.
    pub fn from_config(config: &ForwardingConfig) -> Self {
        if !config.enabled {
            return Self::default();
        }
        Self::new(
            config
                .paths
                .iter()
                .map(|p| ForwardingPath::new(p.from, p.to, p.priority))
                .collect(),
        )
    }

    /// Adds a path, keeping paths sorted by descending priority.
    pub fn add_path(&mut self, path: ForwardingPath) {
        let pos = self
            .paths
            .iter()
            .position(|p| p.priority < path.priority)
            .unwrap_or(self.paths.len());
        self.paths.insert(pos, path);
    }

    /// Installed paths, highest priority first.
    pub fn paths(&self) -> &[ForwardingPath] {
        &self.paths
    }

    /// Current forwarding cycle.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Counters.
    pub const fn stats(&self) -> &ForwardingStats {
        &self.stats
    }

    /// Publishes `instruction`'s result at `stage`.
    ///
    /// Does nothing when the instruction has no destination, targets the zero
    /// register, or has no result yet.
    pub fn forward_data(&mut self, instruction: &Instruction, stage: Stage) {
        let (Some(register), Some(value)) = (instruction.destination(), instruction.result) else {
            return;
        };
        if register.is_zero() {
            return;
        }
        let fv = ForwardedValue {
            producer: instruction.id,
            register,
            value,
            stage,
            cycle: self.cycle,
        };
        tracing::debug!(
            producer = %fv.producer,
            register = %register,
            value,
            stage = stage.name(),
            "forward"
        );
        self.live
            .retain(|v| !(v.producer == fv.producer && v.register == register && v.stage == stage));
        self.live.push(fv);

        let history = self.history.entry(register).or_default();
        if history.len() == HISTORY_DEPTH {
            let _ = history.pop_front();
        }
        history.push_back(fv);
        self.stats.published += 1;
    }

    /// Live values for `consumer`'s source registers arriving at `stage`.
    ///
    /// Only producers older than the consumer are eligible. Paths are searched
    /// in descending priority and the first level holding a value wins; within
    /// one level the newest cycle, then the latest stage, then the youngest
    /// producer is chosen.
    pub fn get_forwarded_values(
        &mut self,
        consumer: &Instruction,
        stage: Stage,
    ) -> Vec<ForwardedValue> {
        let mut found = Vec::new();
        for reg in consumer.sources() {
            if reg.is_zero() {
                continue;
            }
            match self.select(consumer, reg, stage) {
                Some(fv) => {
                    self.stats.hits += 1;
                    found.push(fv);
                }
                None => self.stats.misses += 1,
            }
        }
        found
    }

    /// Forwarded source values for `consumer` at `stage`.
    ///
    /// Registers with no live value are omitted; `None` when nothing is
    /// forwarded.
    pub fn get_forwarded_data(
        &mut self,
        consumer: &Instruction,
        stage: Stage,
    ) -> Option<BTreeMap<Reg, u64>> {
        let map: BTreeMap<Reg, u64> = self
            .get_forwarded_values(consumer, stage)
            .into_iter()
            .map(|fv| (fv.register, fv.value))
            .collect();
        (!map.is_empty()).then_some(map)
    }

    fn select(&mut self, consumer: &Instruction, reg: Reg, stage: Stage) -> Option<ForwardedValue> {
        let mut idx = 0;
        while idx < self.paths.len() {
            let priority = self.paths[idx].priority;
            let level_end = self.paths[idx..]
                .iter()
                .position(|p| p.priority != priority)
                .map_or(self.paths.len(), |n| idx + n);

            let mut candidates = self.live.iter().filter(|fv| {
                fv.register == reg
                    && fv.producer < consumer.id
                    && self.paths[idx..level_end]
                        .iter()
                        .any(|p| p.to == stage && p.from == fv.stage && (p.condition)(consumer))
            });
            if let Some(first) = candidates.next() {
                let mut best = *first;
                let mut competing = false;
                for fv in candidates {
                    competing = true;
                    if (fv.cycle, fv.stage, fv.producer) > (best.cycle, best.stage, best.producer) {
                        best = *fv;
                    }
                }
                if competing {
                    self.stats.conflicts += 1;
                }
                return Some(best);
            }
            idx = level_end;
        }
        None
    }

    /// Returns true if `consumer` reads a register `producer` writes and
    /// `producer` is older.
    pub fn check_dependency(consumer: &Instruction, producer: &Instruction) -> bool {
        producer.id < consumer.id
            && producer
                .destination()
                .is_some_and(|d| !d.is_zero() && consumer.sources().contains(&d))
    }

    /// Most recent value published for `register`, live or historical.
    pub fn latest(&self, register: Reg) -> Option<&ForwardedValue> {
        self.history.get(&register).and_then(VecDeque::back)
    }

    /// Retained history for `register`, oldest first.
    pub fn history(&self, register: Reg) -> impl Iterator<Item = &ForwardedValue> {
        self.history.get(&register).into_iter().flatten()
    }

    /// Ends the current cycle: live values are dropped.
    pub fn clear_cycle_data(&mut self) {
        self.live.clear();
        self.cycle += 1;
    }

    /// Drops live values and history and zeroes the counters. Paths are kept.
    pub fn reset(&mut self) {
        self.live.clear();
        self.history.clear();
        self.cycle = 0;
        self.stats = ForwardingStats::default();
        tracing::info!("forwarding unit reset");
    }

    /// One line per path, highest priority first.
    pub fn describe_paths(&self) -> String {
        let mut out = String::new();
        for p in &self.paths {
            let _ = writeln!(out, "{} -> {} (priority {})", p.from.name(), p.to.name(), p.priority);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn produced(id: u64, text: &str, value: u64) -> Instruction {
        let mut inst = Instruction::from_asm(InstId(id), id * 4, text).unwrap();
        inst.result = Some(value);
        inst
    }

    fn consumer(id: u64, text: &str) -> Instruction {
        Instruction::from_asm(InstId(id), id * 4, text).unwrap()
    }

    #[test]
    fn test_values_expire_at_cycle_boundary() {
        let mut fu = ForwardingUnit::with_default_paths();
        fu.forward_data(&produced(1, "ADD $t0, $t1, $t2", 30), Stage::Execute);
        let sub = consumer(2, "SUB $t3, $t0, $t4");
        assert_eq!(
            fu.get_forwarded_data(&sub, Stage::Issue),
            Some(BTreeMap::from([(Reg::Int(8), 30)]))
        );
        fu.clear_cycle_data();
        assert_eq!(fu.get_forwarded_data(&sub, Stage::Issue), None);
        assert_eq!(fu.latest(Reg::Int(8)).map(|v| v.value), Some(30));
    }

    #[test]
    fn test_higher_priority_path_wins() {
        let mut fu = ForwardingUnit::with_default_paths();
        fu.forward_data(&produced(1, "ADDI $t0, $zero, 1", 1), Stage::Writeback);
        fu.forward_data(&produced(2, "ADDI $t0, $zero, 2", 2), Stage::Execute);
        let values = fu.get_forwarded_values(&consumer(3, "ADD $t1, $t0, $t0"), Stage::Issue);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].producer, InstId(2));
    }

    #[test]
    fn test_younger_producer_is_invisible() {
        let mut fu = ForwardingUnit::with_default_paths();
        fu.forward_data(&produced(5, "ADDI $t0, $zero, 9", 9), Stage::Execute);
        assert_eq!(
            fu.get_forwarded_data(&consumer(3, "ADD $t1, $t0, $t0"), Stage::Issue),
            None
        );
        assert_eq!(fu.stats().misses, 1);
    }

    #[test]
    fn test_same_priority_tie_breaks_on_stage() {
        let mut fu = ForwardingUnit::new(vec![
            ForwardingPath::new(Stage::Execute, Stage::Issue, 1),
            ForwardingPath::new(Stage::Memory, Stage::Issue, 1),
        ]);
        fu.forward_data(&produced(1, "LW $t0, 0($sp)", 7), Stage::Memory);
        fu.forward_data(&produced(2, "ADDI $t0, $zero, 8", 8), Stage::Execute);
        let values = fu.get_forwarded_values(&consumer(3, "ADD $t1, $t0, $zero"), Stage::Issue);
        assert_eq!(values[0].value, 7);
        assert_eq!(fu.stats().conflicts, 1);
    }

    #[test]
    fn test_condition_filters_consumer() {
        fn only_stores(inst: &Instruction) -> bool {
            inst.opcode.is_store()
        }
        let mut fu = ForwardingUnit::new(vec![
            ForwardingPath::new(Stage::Execute, Stage::Issue, 1).when(only_stores),
        ]);
        fu.forward_data(&produced(1, "ADDI $t0, $zero, 4", 4), Stage::Execute);
        assert!(fu.get_forwarded_data(&consumer(2, "ADD $t1, $t0, $t0"), Stage::Issue).is_none());
        assert!(fu.get_forwarded_data(&consumer(3, "SW $t0, 0($sp)"), Stage::Issue).is_some());
    }

    #[test]
    fn test_zero_register_and_missing_result_not_published() {
        let mut fu = ForwardingUnit::with_default_paths();
        fu.forward_data(&produced(1, "ADDI $zero, $zero, 4", 4), Stage::Execute);
        fu.forward_data(&consumer(2, "ADDI $t0, $zero, 4"), Stage::Execute);
        assert_eq!(fu.stats().published, 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut fu = ForwardingUnit::with_default_paths();
        for i in 0..8 {
            fu.forward_data(&produced(i, "ADDI $t0, $zero, 1", i), Stage::Execute);
            fu.clear_cycle_data();
        }
        assert_eq!(fu.history(Reg::Int(8)).count(), HISTORY_DEPTH);
        assert_eq!(fu.latest(Reg::Int(8)).map(|v| v.value), Some(7));
    }

    #[test]
    fn test_check_dependency() {
        let add = consumer(1, "ADD $t0, $t1, $t2");
        let sub = consumer(2, "SUB $t3, $t0, $t4");
        assert!(ForwardingUnit::check_dependency(&sub, &add));
        assert!(!ForwardingUnit::check_dependency(&add, &sub));
    }

    #[test]
    fn test_describe_paths() {
        let text = ForwardingUnit::with_default_paths().describe_paths();
        assert_eq!(text.lines().next(), Some("execute -> issue (priority 3)"));
        assert_eq!(text.lines().count(), 3);
    }
}
