//! Shared configuration and unit helpers for the devmem bandwidth benchmark.
//!
//! Every other crate in the workspace reads the run shape from
//! [`BenchmarkConstants`] and labels its output with the helpers in
//! [`units`].

pub mod config;
pub mod units;

pub use config::{BenchmarkConstants, ConfigError};
pub use units::{size_label, BANDWIDTH_UNIT, ELEMENT_BYTES, GIGA};
