//! Simulator: owns the program, the fetch unit and the engine side-by-side.
//!
//! One [`Simulator::step`] is one clock cycle: the engine ticks over the
//! current fetch queue, a recovery redirects fetch, then fetch refills the
//! queue for the next cycle.

use std::time::{Duration, Instant};

use crate::common::error::SimError;
use crate::config::Config;
use crate::core::pipeline::engine::{CycleOutcome, Engine};
use crate::sim::fetch::FetchUnit;
use crate::sim::loader::Program;
use crate::stats::{SimStats, UnitReport};

/// Why [`Simulator::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Every instruction retired and every store drained.
    Completed,
    /// `general.max_cycles` was reached first.
    CycleLimit,
}

/// Result of [`Simulator::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles simulated.
    pub cycles: u64,
    /// Instructions retired.
    pub retired: u64,
    /// Why the run ended.
    pub reason: StopReason,
}

/// Top-level simulator: program, front end and out-of-order engine.
#[derive(Debug)]
pub struct Simulator {
    program: Program,
    fetch: FetchUnit,
    engine: Engine,
    max_cycles: u64,
    host_time: Duration,
}

impl Simulator {
    /// Validates `config` and builds a simulator for `program`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration is out of range.
    pub fn new(config: &Config, program: Program) -> Result<Self, SimError> {
        config.validate()?;
        let engine = Engine::new(config)?;
        tracing::info!(
            instructions = program.len(),
            max_cycles = config.general.max_cycles,
            "simulator created"
        );
        Ok(Self {
            program,
            fetch: FetchUnit::new(&config.pipeline),
            engine,
            max_cycles: config.general.max_cycles,
            host_time: Duration::ZERO,
        })
    }

    /// Loaded program.
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Execution engine.
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Execution engine, mutably, for setting initial registers or memory.
    pub const fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Front end.
    pub const fn fetch(&self) -> &FetchUnit {
        &self.fetch
    }

    /// Returns true once the program has been fully fetched, every
    /// instruction has left the engine and every store has drained.
    pub fn is_finished(&self) -> bool {
        self.fetch.is_done(&self.program) && self.engine.is_idle()
    }

    /// Advances the simulator by one clock cycle.
    pub fn step(&mut self) -> CycleOutcome {
        let outcome = self.engine.tick(self.fetch.queue_mut());
        if let Some(pc) = outcome.redirect {
            self.fetch.redirect(pc);
        }
        let _ = self.fetch.fetch(&self.program, self.engine.branch_mut());
        outcome
    }

    /// Runs until the program finishes or the cycle limit is reached.
    pub fn run(&mut self) -> RunSummary {
        let started = Instant::now();
        let reason = loop {
            if self.is_finished() {
                break StopReason::Completed;
            }
            if self.engine.cycle() >= self.max_cycles {
                tracing::warn!(cycles = self.max_cycles, "cycle limit reached");
                break StopReason::CycleLimit;
            }
            let _ = self.step();
        };
        self.host_time += started.elapsed();

        let summary = RunSummary {
            cycles: self.engine.cycle(),
            retired: self.engine.stats().committed,
            reason,
        };
        tracing::info!(
            cycles = summary.cycles,
            retired = summary.retired,
            reason = ?summary.reason,
            "simulation finished"
        );
        summary
    }

    /// Snapshot of every counter.
    pub fn stats(&self) -> SimStats {
        let engine = &self.engine;
        SimStats {
            host_seconds: self.host_time.as_secs_f64(),
            cycles: engine.cycle(),
            instructions_retired: engine.stats().committed,
            core: *engine.stats(),
            hazards: *engine.scoreboard().stats(),
            reservation_stations: *engine.reservation_stations().stats(),
            forwarding: *engine.forwarding().stats(),
            branch: *engine.branch().stats(),
            cache: *engine.memory().cache().stats(),
            memory: *engine.memory().stats(),
            units: engine
                .units()
                .iter()
                .map(|u| UnitReport {
                    name: u.name().to_string(),
                    stats: *u.stats(),
                })
                .collect(),
            failed: engine.failed().to_vec(),
        }
    }
}
