//! designfirst CLI library.
//!
//! Project configuration and output rendering used by the `designfirst`
//! binary, exposed for testing.

pub mod config;
pub mod output;
