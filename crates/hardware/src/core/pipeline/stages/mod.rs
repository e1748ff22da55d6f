//! Engine stage implementations.
//!
//! Each submodule adds one stage to [`super::engine::Engine`]. The engine
//! calls them once per cycle in the order commit, complete, dispatch, issue.

/// Commit stage: in-order retirement and fault reporting.
pub mod commit;

/// Complete stage: result broadcast and misprediction recovery.
pub mod complete;

/// Dispatch stage: reservation station to functional unit.
pub mod dispatch;

/// Issue stage: fetch queue to reservation station and ROB.
pub mod issue;
