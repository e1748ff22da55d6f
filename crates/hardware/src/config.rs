//! Configuration system for the superscalar simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline machine parameters (widths, buffer sizes, unit counts, caches).
//! 2. **Structures:** Hierarchical config for general, pipeline, units, forwarding,
//!    branch predictor, cache and memory settings.
//! 3. **Validation:** Range checks applied after deserialization.
//!
//! Configuration is supplied as JSON; every field is optional and falls back to
//! its default.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;
use crate::core::pipeline::forwarding::Stage;
use crate::isa::opcode::{Opcode, UnitKind};

/// Default configuration constants for the simulator.
mod defaults {
    /// Cycle limit for a single run.
    pub const MAX_CYCLES: u64 = 10_000;

    /// Instructions fetched per cycle.
    pub const FETCH_WIDTH: usize = 4;

    /// Instructions issued into reservation stations per cycle.
    pub const ISSUE_WIDTH: usize = 4;

    /// Instructions retired from the ROB head per cycle.
    pub const COMMIT_WIDTH: usize = 4;

    /// Decoded instructions buffered between fetch and issue.
    pub const FETCH_QUEUE_SIZE: usize = 16;

    /// Reorder buffer entries.
    pub const ROB_SIZE: usize = 32;

    /// Reservation station entries (shared pool).
    pub const RS_SIZE: usize = 16;

    /// Store buffer entries.
    pub const STORE_BUFFER_SIZE: usize = 8;

    /// Integer ALUs.
    pub const ALU_COUNT: usize = 2;

    /// Floating-point units.
    pub const FPU_COUNT: usize = 1;

    /// Load/store units.
    pub const LSU_COUNT: usize = 1;

    /// Predictor pattern table entries.
    pub const PREDICTOR_ENTRIES: usize = 1024;

    /// Global history bits for gshare.
    pub const HISTORY_LENGTH: usize = 8;

    /// Branch target buffer entries.
    pub const BTB_SIZE: usize = 256;

    /// Data cache size in bytes (32 KiB).
    pub const CACHE_SIZE: usize = 32768;

    /// Data cache block size in bytes.
    pub const CACHE_BLOCK: usize = 64;

    /// Data cache associativity.
    pub const CACHE_WAYS: usize = 4;

    /// Extra cycles added to a load that misses the data cache.
    pub const MISS_PENALTY: u32 = 10;

    /// Main memory size in bytes (1 MiB).
    pub const MEMORY_SIZE: usize = 1 << 20;
}

/// Root configuration structure.
///
/// # Example
///
/// ```
/// use sspsim_core::config::{Config, PredictorKind};
///
/// let json = r#"{
///     "pipeline": { "issue_width": 2, "rob_size": 8 },
///     "units": { "alu": { "count": 1 }, "latencies": { "MUL": 4 } },
///     "branch_predictor": { "type": "bimodal" }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.pipeline.issue_width, 2);
/// assert_eq!(config.pipeline.fetch_width, 4);
/// assert_eq!(config.branch_predictor.kind, PredictorKind::Bimodal);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run limits and tracing.
    pub general: GeneralConfig,
    /// Widths and buffer sizes.
    pub pipeline: PipelineConfig,
    /// Functional-unit inventory and latency overrides.
    pub units: UnitsConfig,
    /// Bypass network.
    pub forwarding: ForwardingConfig,
    /// Branch predictor.
    pub branch_predictor: BranchPredictorConfig,
    /// Data cache.
    pub cache: CacheConfig,
    /// Main memory.
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every value against its permitted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        check_range("pipeline.fetch_width", p.fetch_width, 1, 8)?;
        check_range("pipeline.issue_width", p.issue_width, 1, 8)?;
        check_range("pipeline.commit_width", p.commit_width, 1, 8)?;
        check_range("pipeline.fetch_queue_size", p.fetch_queue_size, 1, 1024)?;
        check_range("pipeline.rob_size", p.rob_size, 1, 1024)?;
        check_range("pipeline.rs_size", p.rs_size, 1, 1024)?;
        check_range("pipeline.store_buffer_size", p.store_buffer_size, 1, 1024)?;

        for kind in UnitKind::ALL {
            let name = format!("units.{}.count", kind.name().to_ascii_lowercase());
            check_range(&name, self.units.count(kind), 1, 8)?;
        }
        let _ = self.units.latency_overrides()?;

        let bp = &self.branch_predictor;
        check_range("branch_predictor.num_entries", bp.num_entries, 64, 65536)?;
        check_power_of_two("branch_predictor.num_entries", bp.num_entries)?;
        check_range("branch_predictor.history_length", bp.history_length, 1, 16)?;
        if bp.kind == PredictorKind::Gshare && bp.history_length > 12 {
            return Err(ConfigError::Invalid(
                "branch_predictor.history_length must be <= 12 for gshare".into(),
            ));
        }
        check_range("branch_predictor.btb_size", bp.btb_size, 1, 65536)?;
        check_power_of_two("branch_predictor.btb_size", bp.btb_size)?;

        let c = &self.cache;
        check_range("cache.size", c.size, 1024, 1 << 20)?;
        check_range("cache.block_size", c.block_size, 16, 256)?;
        check_power_of_two("cache.block_size", c.block_size)?;
        check_range("cache.associativity", c.associativity, 1, 16)?;
        if c.size % (c.block_size * c.associativity) != 0 {
            return Err(ConfigError::Invalid(
                "cache.size must be a multiple of block_size * associativity".into(),
            ));
        }

        check_range("memory.size", self.memory.size, 1 << 16, 1 << 27)?;

        for path in &self.forwarding.paths {
            if path.from <= path.to {
                return Err(ConfigError::Invalid(format!(
                    "forwarding path {:?} -> {:?} must flow to an earlier stage",
                    path.from, path.to
                )));
            }
        }
        Ok(())
    }
}

fn check_range(field: &str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} = {value} is outside {min}..={max}"
        )))
    }
}

fn check_power_of_two(field: &str, value: usize) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} = {value} must be a power of two"
        )))
    }
}

/// Run limits and tracing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Stop after this many cycles even if the program has not drained.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Log every committed instruction at `info` level.
    #[serde(default)]
    pub trace_instructions: bool,
}

impl GeneralConfig {
    const fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
            trace_instructions: false,
        }
    }
}

/// Superscalar widths and buffer capacities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Instructions fetched per cycle.
    #[serde(default = "PipelineConfig::default_fetch_width")]
    pub fetch_width: usize,

    /// Instructions issued per cycle.
    #[serde(default = "PipelineConfig::default_issue_width")]
    pub issue_width: usize,

    /// Instructions committed per cycle.
    #[serde(default = "PipelineConfig::default_commit_width")]
    pub commit_width: usize,

    /// Capacity of the fetch queue.
    #[serde(default = "PipelineConfig::default_fetch_queue_size")]
    pub fetch_queue_size: usize,

    /// Reorder buffer entries.
    #[serde(default = "PipelineConfig::default_rob_size")]
    pub rob_size: usize,

    /// Reservation station entries.
    #[serde(default = "PipelineConfig::default_rs_size")]
    pub rs_size: usize,

    /// Store buffer entries.
    #[serde(default = "PipelineConfig::default_store_buffer_size")]
    pub store_buffer_size: usize,
}

impl PipelineConfig {
    const fn default_fetch_width() -> usize {
        defaults::FETCH_WIDTH
    }

    const fn default_issue_width() -> usize {
        defaults::ISSUE_WIDTH
    }

    const fn default_commit_width() -> usize {
        defaults::COMMIT_WIDTH
    }

    const fn default_fetch_queue_size() -> usize {
        defaults::FETCH_QUEUE_SIZE
    }

    const fn default_rob_size() -> usize {
        defaults::ROB_SIZE
    }

    const fn default_rs_size() -> usize {
        defaults::RS_SIZE
    }

    const fn default_store_buffer_size() -> usize {
        defaults::STORE_BUFFER_SIZE
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_width: defaults::FETCH_WIDTH,
            issue_width: defaults::ISSUE_WIDTH,
            commit_width: defaults::COMMIT_WIDTH,
            fetch_queue_size: defaults::FETCH_QUEUE_SIZE,
            rob_size: defaults::ROB_SIZE,
            rs_size: defaults::RS_SIZE,
            store_buffer_size: defaults::STORE_BUFFER_SIZE,
        }
    }
}

/// Instance count for one functional-unit class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Number of units of this class.
    pub count: usize,
}

/// Functional-unit inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitsConfig {
    /// Integer ALUs.
    #[serde(default = "UnitsConfig::default_alu")]
    pub alu: UnitConfig,

    /// Floating-point units.
    #[serde(default = "UnitsConfig::default_fpu")]
    pub fpu: UnitConfig,

    /// Load/store units.
    #[serde(default = "UnitsConfig::default_lsu")]
    pub lsu: UnitConfig,

    /// Per-opcode latency overrides keyed by mnemonic, e.g. `{"DIV": 20}`.
    #[serde(default)]
    pub latencies: BTreeMap<String, u32>,
}

impl UnitsConfig {
    const fn default_alu() -> UnitConfig {
        UnitConfig {
            count: defaults::ALU_COUNT,
        }
    }

    const fn default_fpu() -> UnitConfig {
        UnitConfig {
            count: defaults::FPU_COUNT,
        }
    }

    const fn default_lsu() -> UnitConfig {
        UnitConfig {
            count: defaults::LSU_COUNT,
        }
    }

    /// Number of units of `kind`.
    pub const fn count(&self, kind: UnitKind) -> usize {
        match kind {
            UnitKind::Alu => self.alu.count,
            UnitKind::Fpu => self.fpu.count,
            UnitKind::Lsu => self.lsu.count,
        }
    }

    /// Resolves the latency overrides to opcodes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown mnemonic or a zero latency.
    pub fn latency_overrides(&self) -> Result<BTreeMap<Opcode, u32>, ConfigError> {
        self.latencies
            .iter()
            .map(|(name, &cycles)| {
                let opcode: Opcode = name
                    .parse()
                    .map_err(|e| ConfigError::Invalid(format!("units.latencies: {e}")))?;
                if cycles == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "units.latencies.{name} must be at least 1"
                    )));
                }
                Ok((opcode, cycles))
            })
            .collect()
    }
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            alu: Self::default_alu(),
            fpu: Self::default_fpu(),
            lsu: Self::default_lsu(),
            latencies: BTreeMap::new(),
        }
    }
}

/// One declared bypass path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Producing stage.
    pub from: Stage,
    /// Consuming stage.
    pub to: Stage,
    /// Higher priorities are consulted first.
    pub priority: u8,
}

/// Bypass network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingConfig {
    /// When false no paths are installed and operands come from broadcasts,
    /// the reorder buffer or the register file.
    #[serde(default = "ForwardingConfig::default_enabled")]
    pub enabled: bool,

    /// Declared paths.
    #[serde(default = "ForwardingConfig::default_paths")]
    pub paths: Vec<PathConfig>,
}

impl ForwardingConfig {
    const fn default_enabled() -> bool {
        true
    }

    fn default_paths() -> Vec<PathConfig> {
        vec![
            PathConfig {
                from: Stage::Execute,
                to: Stage::Issue,
                priority: 3,
            },
            PathConfig {
                from: Stage::Memory,
                to: Stage::Issue,
                priority: 2,
            },
            PathConfig {
                from: Stage::Writeback,
                to: Stage::Issue,
                priority: 1,
            },
        ]
    }
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            paths: Self::default_paths(),
        }
    }
}

/// Branch predictor algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    /// Predict every conditional branch taken.
    AlwaysTaken,
    /// Per-address 2-bit saturating counters.
    Bimodal,
    /// Counters indexed by address XOR global history.
    #[default]
    Gshare,
}

/// Branch predictor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPredictorConfig {
    /// Algorithm.
    #[serde(rename = "type", default)]
    pub kind: PredictorKind,

    /// Pattern table entries.
    #[serde(default = "BranchPredictorConfig::default_num_entries")]
    pub num_entries: usize,

    /// Global history bits (gshare only).
    #[serde(default = "BranchPredictorConfig::default_history_length")]
    pub history_length: usize,

    /// Branch target buffer entries, used for register-indirect jumps.
    #[serde(default = "BranchPredictorConfig::default_btb_size")]
    pub btb_size: usize,
}

impl BranchPredictorConfig {
    const fn default_num_entries() -> usize {
        defaults::PREDICTOR_ENTRIES
    }

    const fn default_history_length() -> usize {
        defaults::HISTORY_LENGTH
    }

    const fn default_btb_size() -> usize {
        defaults::BTB_SIZE
    }
}

impl Default for BranchPredictorConfig {
    fn default() -> Self {
        Self {
            kind: PredictorKind::default(),
            num_entries: defaults::PREDICTOR_ENTRIES,
            history_length: defaults::HISTORY_LENGTH,
            btb_size: defaults::BTB_SIZE,
        }
    }
}

/// Data cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false every load pays the miss penalty.
    #[serde(default = "CacheConfig::default_enabled")]
    pub enabled: bool,

    /// Total size in bytes.
    #[serde(default = "CacheConfig::default_size")]
    pub size: usize,

    /// Block (line) size in bytes.
    #[serde(default = "CacheConfig::default_block_size")]
    pub block_size: usize,

    /// Ways per set.
    #[serde(default = "CacheConfig::default_associativity")]
    pub associativity: usize,

    /// Extra cycles for a load that misses.
    #[serde(default = "CacheConfig::default_miss_penalty")]
    pub miss_penalty: u32,
}

impl CacheConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    const fn default_block_size() -> usize {
        defaults::CACHE_BLOCK
    }

    const fn default_associativity() -> usize {
        defaults::CACHE_WAYS
    }

    const fn default_miss_penalty() -> u32 {
        defaults::MISS_PENALTY
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: defaults::CACHE_SIZE,
            block_size: defaults::CACHE_BLOCK,
            associativity: defaults::CACHE_WAYS,
            miss_penalty: defaults::MISS_PENALTY,
        }
    }
}

/// Main memory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Size in bytes; addresses `0..size` are valid.
    #[serde(default = "MemoryConfig::default_size")]
    pub size: usize,
}

impl MemoryConfig {
    const fn default_size() -> usize {
        defaults::MEMORY_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: defaults::MEMORY_SIZE,
        }
    }
}
