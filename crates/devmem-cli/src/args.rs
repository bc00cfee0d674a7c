//! Command-line arguments and how they layer onto the configuration.

use std::path::PathBuf;

use clap::Parser;
use devmem_common::{BenchmarkConstants, ConfigError};
use devmem_engine::{OptionDatabase, OptionError, OptionValue, OPT_PASSES, OPT_QUIET, OPT_VERBOSE};

use crate::output::{OutputConfig, OutputFormat};

/// devmem - device memory bandwidth benchmark
#[derive(Debug, Parser)]
#[command(name = "devmem")]
#[command(about = "Measure device memory read/write bandwidth with streaming kernels")]
#[command(long_about = r#"
Runs a multi-threaded streaming read kernel and write kernel against a buffer
staged in device memory, timing each one per pass and reporting GB/s.

Constants are layered: built-in defaults, then --config, then DEVMEM_*
environment variables, then the flags below.

Examples:
  # Default run (10 passes)
  devmem

  # Small, quick run
  devmem --threads 8 --elements-per-thread 4096 --repetitions 10 --passes 3

  # Machine-readable results
  devmem --format json --output results.json
"#)]
#[command(version)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of measurement passes
    #[arg(short, long, value_name = "N")]
    pub passes: Option<i64>,

    /// Print test parameters and per-kernel timings
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Worker threads per kernel
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Elements in each worker's slice
    #[arg(long, value_name = "N")]
    pub elements_per_thread: Option<usize>,

    /// Sweeps over the slice inside one timed kernel
    #[arg(long, value_name = "N")]
    pub repetitions: Option<u32>,

    /// Device memory limit in bytes (0 = unlimited)
    #[arg(long, value_name = "BYTES")]
    pub memory_limit: Option<u64>,

    /// Result format (text, json, csv)
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: OutputFormat,

    /// Write results to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print the effective constants as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Defaults, config file, environment, then flags; validated once.
    pub fn resolve_constants(&self) -> Result<BenchmarkConstants, ConfigError> {
        let mut constants = BenchmarkConstants::from_sources(self.config.as_deref())?;
        if let Some(threads) = self.threads {
            constants.thread_count = threads;
        }
        if let Some(elements) = self.elements_per_thread {
            constants.elements_per_thread = elements;
        }
        if let Some(reps) = self.repetitions {
            constants.repetitions_per_pass = reps;
        }
        if let Some(limit) = self.memory_limit {
            constants.memory_limit_bytes = limit;
        }
        constants.validate()?;
        Ok(constants)
    }

    /// Registered run options with the flag values applied.
    pub fn option_database(&self) -> Result<OptionDatabase, OptionError> {
        let mut options = OptionDatabase::with_defaults();
        if let Some(passes) = self.passes {
            options.set(OPT_PASSES, OptionValue::Int(passes))?;
        }
        options.set(OPT_VERBOSE, OptionValue::Bool(self.verbose))?;
        options.set(OPT_QUIET, OptionValue::Bool(self.quiet))?;
        Ok(options)
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig { format: self.format, quiet: self.quiet, verbose: self.verbose }
    }
}
