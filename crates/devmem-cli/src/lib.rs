//! devmem CLI library
//!
//! This library exposes internal modules for testing purposes.

pub mod args;
pub mod exit;
pub mod output;

pub use args::Cli;
pub use output::{BenchmarkOutput, OutputConfig, OutputFormat};
