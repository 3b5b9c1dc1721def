//! Regression tests for the `designfirst` binary.
//!
//! The tests live in `cli` and run against the fixtures under
//! `tests/fixtures` at the workspace root.

#[cfg(test)]
pub mod cli;
