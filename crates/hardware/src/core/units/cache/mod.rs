//! Set-Associative Data Cache.
//!
//! A presence model: the cache tracks which blocks are resident and reports
//! hits and misses so the load/store unit can charge the miss penalty. Data
//! itself always lives in main memory.

/// Cache replacement policies.
pub mod policies;

use serde::Serialize;

use self::policies::{LruPolicy, ReplacementPolicy};
use crate::config::CacheConfig;

/// Cache line entry containing tag and validity.
#[derive(Clone, Copy, Debug, Default)]
struct CacheLine {
    tag: u64,
    valid: bool,
}

/// Hit and miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Accesses that found their block resident.
    pub hits: u64,
    /// Accesses that installed their block.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of accesses that hit.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Set-associative cache with LRU replacement.
#[derive(Debug)]
pub struct DataCache {
    /// When false every access misses and nothing is installed.
    pub enabled: bool,
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    block_bytes: usize,
    policy: Box<dyn ReplacementPolicy>,
    stats: CacheStats,
}

impl DataCache {
    /// Creates a cache with the configured geometry.
    pub fn new(config: &CacheConfig) -> Self {
        let ways = config.associativity.max(1);
        let block_bytes = config.block_size.max(1);
        let num_sets = (config.size / block_bytes / ways).max(1);
        Self {
            enabled: config.enabled,
            lines: vec![CacheLine::default(); num_sets * ways],
            num_sets,
            ways,
            block_bytes,
            policy: Box::new(LruPolicy::new(num_sets, ways)),
            stats: CacheStats::default(),
        }
    }

    /// Number of sets.
    pub const fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Counters.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    const fn locate(&self, addr: u64) -> (usize, u64) {
        let block = addr / self.block_bytes as u64;
        let set = (block % self.num_sets as u64) as usize;
        let tag = block / self.num_sets as u64;
        (set, tag)
    }

    /// Returns true if the block holding `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        if !self.enabled {
            return false;
        }
        let (set, tag) = self.locate(addr);
        self.lines[set * self.ways..(set + 1) * self.ways]
            .iter()
            .any(|l| l.valid && l.tag == tag)
    }

    /// Looks up `addr`, installing its block on a miss. Returns true on a hit.
    pub fn access(&mut self, addr: u64) -> bool {
        if !self.enabled {
            self.stats.misses += 1;
            return false;
        }
        let (set, tag) = self.locate(addr);
        let base = set * self.ways;

        let hit_way = (0..self.ways).find(|&w| {
            let line = self.lines[base + w];
            line.valid && line.tag == tag
        });
        if let Some(way) = hit_way {
            self.policy.update(set, way);
            self.stats.hits += 1;
            return true;
        }

        let victim = self.policy.get_victim(set);
        self.lines[base + victim] = CacheLine { tag, valid: true };
        self.policy.update(set, victim);
        self.stats.misses += 1;
        false
    }

    /// Invalidates every line. Counters are kept.
    pub fn invalidate_all(&mut self) {
        self.lines.fill(CacheLine::default());
    }
}
