//! Out-of-order instruction pipeline.
//!
//! This module contains the dynamic scheduling machinery of the core:
//! 1. **Reservation stations:** Hold issued instructions until their operands arrive.
//! 2. **Scoreboard:** Tracks register writers/readers and functional-unit occupancy.
//! 3. **Forwarding:** Publishes results so waiting operands skip the register file.
//! 4. **Reorder buffer:** Retires results in program order and holds faults.
//! 5. **Store buffer:** Queues store data until retirement, forwards to loads.
//! 6. **Engine and stages:** The per-cycle commit, complete, dispatch and issue logic.

/// Per-cycle engine owning all pipeline structures.
pub mod engine;

/// Result bypass network.
pub mod forwarding;

/// Tomasulo-style reservation stations.
pub mod reservation;

/// Reorder buffer for in-order retirement.
pub mod rob;

/// Register and functional-unit status tracking.
pub mod scoreboard;

/// Stage implementations (commit, complete, dispatch, issue).
pub mod stages;

/// Store buffer with store-to-load forwarding.
pub mod store_buffer;

pub use self::engine::{CycleOutcome, Engine};
