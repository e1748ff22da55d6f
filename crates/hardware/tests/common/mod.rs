//! Shared helpers for the integration tests.

pub mod builders;
pub mod harness;
pub mod mocks;
