//! Cache Replacement Policies.
//!
//! Selects the victim way when a set-associative cache installs a new line.

/// Least Recently Used replacement policy.
pub mod lru;

pub use lru::LruPolicy;

/// Trait for cache replacement policies.
///
/// Defines the interface for updating usage state and selecting victim lines.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Records an access to `way` of `set`.
    fn update(&mut self, set: usize, way: usize);

    /// Selects the way to evict from `set`.
    fn get_victim(&mut self, set: usize) -> usize;
}
