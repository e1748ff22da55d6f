//! Core pipeline and functional-unit tests.

/// Per-cycle engine behaviour.
pub mod engine;

/// Bypass network.
pub mod forwarding;

/// Reorder buffer.
pub mod rob;

/// Reservation stations working with the scoreboard.
pub mod scheduling;

/// Functional units.
pub mod units;
