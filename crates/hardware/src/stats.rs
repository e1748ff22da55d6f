//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the simulator. It provides:
//! 1. **Cycle and IPC:** Total cycles, retired instructions and derived metrics.
//! 2. **Core:** Issue, dispatch and commit counts, stall reasons, ROB and RS occupancy.
//! 3. **Hazards:** RAW/WAR/WAW/structural counts from the scoreboard.
//! 4. **Branch prediction:** Predictions, mispredictions and accuracy.
//! 5. **Memory:** Cache hit/miss, store forwarding and operand bypass counts.
//!
//! Every structure here derives `Serialize` so the CLI can export a run as JSON.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::pipeline::forwarding::ForwardingStats;
use crate::core::pipeline::reservation::RsStats;
use crate::core::pipeline::scoreboard::ScoreboardStats;
use crate::core::units::UnitStats;
use crate::core::units::bru::BranchStats;
use crate::core::units::cache::CacheStats;
use crate::soc::system::MemoryStats;

/// Why issue stopped early in a cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StallStats {
    /// Reorder buffer full.
    pub rob_full: u64,
    /// Every reservation station busy.
    pub rs_full: u64,
    /// Destination still owned by an in-flight writer.
    pub waw: u64,
    /// Store buffer full.
    pub store_buffer_full: u64,
}

impl StallStats {
    /// Sum of all stall reasons.
    pub const fn total(&self) -> u64 {
        self.rob_full + self.rs_full + self.waw + self.store_buffer_full
    }
}

/// Counters kept by the pipeline engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoreStats {
    /// Cycles ticked.
    pub cycles: u64,
    /// Instructions issued into reservation stations.
    pub issued: u64,
    /// Instructions started on a functional unit.
    pub dispatched: u64,
    /// Results delivered to the reorder buffer.
    pub completed: u64,
    /// Instructions retired.
    pub committed: u64,
    /// Instructions aborted by an execution error.
    pub failed: u64,
    /// Misprediction and fault recoveries.
    pub recoveries: u64,
    /// Reorder buffer entries discarded by recoveries.
    pub flushed: u64,
    /// Issue stalls by reason.
    pub stalls: StallStats,
    /// Sum of ROB occupancy over cycles.
    pub rob_occupancy_sum: u64,
    /// Highest ROB occupancy seen.
    pub rob_peak: usize,
}

impl CoreStats {
    /// Mean ROB occupancy per cycle.
    pub fn average_rob_occupancy(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.rob_occupancy_sum as f64 / self.cycles as f64
        }
    }
}

/// An instruction aborted by an execution error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedInstruction {
    /// Program-order sequence number.
    pub id: u64,
    /// Instruction address.
    pub pc: u64,
    /// Mnemonic.
    pub opcode: String,
    /// Operands as written.
    pub operands: String,
    /// Stage that raised the error.
    pub stage: String,
    /// Cycle the failure was reported.
    pub cycle: u64,
    /// Error message.
    pub error: String,
}

/// Per-unit counters with the unit name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    /// Unit instance name.
    pub name: String,
    /// Counters.
    #[serde(flatten)]
    pub stats: UnitStats,
}

/// Snapshot of every counter at the end of a run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SimStats {
    /// Host wall-clock time spent simulating.
    pub host_seconds: f64,
    /// Total simulated cycles.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_retired: u64,
    /// Engine counters.
    pub core: CoreStats,
    /// Scoreboard hazard counters.
    pub hazards: ScoreboardStats,
    /// Reservation station counters.
    pub reservation_stations: RsStats,
    /// Bypass network counters.
    pub forwarding: ForwardingStats,
    /// Branch prediction counters.
    pub branch: BranchStats,
    /// Data cache counters.
    pub cache: CacheStats,
    /// Load/store traffic counters.
    pub memory: MemoryStats,
    /// Functional units.
    pub units: Vec<UnitReport>,
    /// Instructions aborted by execution errors.
    pub failed: Vec<FailedInstruction>,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"core"`, `"hazards"`, `"branch"`, `"memory"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "core", "hazards", "branch", "memory"];

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl SimStats {
    /// Instructions committed per cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_retired as f64 / self.cycles as f64
        }
    }

    /// Renders the requested sections as text.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]; an
    /// empty slice renders every section.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let cyc = self.cycles;
        let mut out = String::new();

        let _ = writeln!(out, "\n==========================================================");
        let _ = writeln!(out, "SUPERSCALAR PIPELINE SIMULATION STATISTICS");
        let _ = writeln!(out, "==========================================================");
        if want("summary") {
            let cpi = if self.instructions_retired == 0 {
                0.0
            } else {
                cyc as f64 / self.instructions_retired as f64
            };
            let _ = writeln!(out, "host_seconds             {:.4} s", self.host_seconds);
            let _ = writeln!(out, "sim_cycles               {cyc}");
            let _ = writeln!(out, "sim_insts                {}", self.instructions_retired);
            let _ = writeln!(out, "sim_ipc                  {:.4}", self.ipc());
            let _ = writeln!(out, "sim_cpi                  {cpi:.4}");
            let _ = writeln!(out, "sim_failed               {}", self.failed.len());
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("core") {
            let core = &self.core;
            let _ = writeln!(out, "CORE BREAKDOWN");
            let _ = writeln!(out, "  issued                 {}", core.issued);
            let _ = writeln!(out, "  dispatched             {}", core.dispatched);
            let _ = writeln!(out, "  completed              {}", core.completed);
            let _ = writeln!(out, "  committed              {}", core.committed);
            let _ = writeln!(out, "  recoveries             {}", core.recoveries);
            let _ = writeln!(out, "  flushed                {}", core.flushed);
            for (name, count) in [
                ("stalls.rob_full", core.stalls.rob_full),
                ("stalls.rs_full", core.stalls.rs_full),
                ("stalls.waw", core.stalls.waw),
                ("stalls.store_buffer", core.stalls.store_buffer_full),
            ] {
                let _ = writeln!(
                    out,
                    "  {name:<22} {count} ({:.2}%)",
                    percent(count, cyc)
                );
            }
            let _ = writeln!(
                out,
                "  rob.occupancy          {:.2} avg, {} peak",
                core.average_rob_occupancy(),
                core.rob_peak
            );
            let rs = &self.reservation_stations;
            let rs_avg = if rs.cycles == 0 {
                0.0
            } else {
                rs.occupancy_sum as f64 / rs.cycles as f64
            };
            let _ = writeln!(out, "  rs.occupancy           {rs_avg:.2} avg, {} peak", rs.peak);
            for unit in &self.units {
                let _ = writeln!(
                    out,
                    "  unit.{:<17} {} executed, {:.2}% busy",
                    unit.name,
                    unit.stats.executed,
                    percent(unit.stats.busy_cycles, cyc)
                );
            }
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("hazards") {
            let h = &self.hazards;
            let _ = writeln!(out, "HAZARDS");
            let _ = writeln!(out, "  hazard.raw             {}", h.raw);
            let _ = writeln!(out, "  hazard.war             {}", h.war);
            let _ = writeln!(out, "  hazard.waw             {}", h.waw);
            let _ = writeln!(out, "  hazard.structural      {}", h.structural);
            let f = &self.forwarding;
            let _ = writeln!(out, "  forward.published      {}", f.published);
            let _ = writeln!(out, "  forward.hits           {}", f.hits);
            let _ = writeln!(out, "  forward.conflicts      {}", f.conflicts);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("branch") {
            let b = &self.branch;
            let _ = writeln!(out, "BRANCH PREDICTION");
            let _ = writeln!(out, "  bp.lookups             {}", b.predictions);
            let _ = writeln!(out, "  bp.committed           {}", b.committed);
            let _ = writeln!(out, "  bp.mispredicts         {}", b.mispredictions);
            let _ = writeln!(out, "  bp.accuracy            {:.2}%", b.accuracy() * 100.0);
            let _ = writeln!(out, "  btb.hits               {}", b.btb_hits);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("memory") {
            let c = &self.cache;
            let m = &self.memory;
            let total = c.hits + c.misses;
            let _ = writeln!(out, "MEMORY HIERARCHY");
            let _ = writeln!(
                out,
                "  L1-D   accesses: {total:<10} | hits: {:<10} | miss_rate: {:.2}%",
                c.hits,
                percent(c.misses, total)
            );
            let _ = writeln!(out, "  loads                  {}", m.loads);
            let _ = writeln!(out, "  stores                 {}", m.stores);
            let _ = writeln!(out, "  loads.forwarded        {}", m.forwarded_loads);
            let _ = writeln!(out, "  loads.partial_forward  {}", m.partial_forwards);
            let _ = writeln!(out, "  stores.drained         {}", m.drained);
        }
        if !self.failed.is_empty() && want("summary") {
            let _ = writeln!(out, "----------------------------------------------------------");
            let _ = writeln!(out, "FAILED INSTRUCTIONS");
            for f in &self.failed {
                let _ = writeln!(
                    out,
                    "  cycle {:<6} {:#06x} {} {} [{}] {}",
                    f.cycle, f.pc, f.opcode, f.operands, f.stage, f.error
                );
            }
        }
        let _ = writeln!(out, "==========================================================");
        out
    }

    /// Prints only the requested statistics sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
