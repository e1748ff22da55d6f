//! Program-level test harness.

use sspsim_core::config::Config;
use sspsim_core::sim::{Program, RunSummary, Simulator};
use sspsim_core::stats::SimStats;

/// Installs a test-friendly `tracing` subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A simulator loaded with a program.
#[derive(Debug)]
pub struct TestContext {
    pub sim: Simulator,
}

impl TestContext {
    pub fn new(source: &str) -> Self {
        Self::with_config(source, &Config::default())
    }

    pub fn with_config(source: &str, config: &Config) -> Self {
        init_tracing();
        let program = Program::parse(source).unwrap();
        let sim = Simulator::new(config, program).unwrap();
        Self { sim }
    }

    /// Sets a register before the run.
    pub fn set_reg(mut self, name: &str, value: u64) -> Self {
        self.sim
            .engine_mut()
            .regs_mut()
            .write_register(name, value)
            .unwrap();
        self
    }

    pub fn run(&mut self) -> RunSummary {
        self.sim.run()
    }

    pub fn reg(&self, name: &str) -> u64 {
        self.sim.engine().regs().read_register(name).unwrap()
    }

    pub fn stats(&self) -> SimStats {
        self.sim.stats()
    }
}
