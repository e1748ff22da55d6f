//! Whole-program simulation tests.

mod programs;
