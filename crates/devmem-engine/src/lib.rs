//! Benchmark execution engine for the devmem device-memory bandwidth test.
//!
//! [`DeviceMemoryBenchmark`] drives the timed read and write kernels from
//! `devmem-kernels` through a [`DeviceSubstrate`], converts each timed
//! interval into GB/s, and appends the figures to a [`ResultSink`]. The
//! collaborators it talks to (options, timer, device, sink) are traits here,
//! each with one in-process implementation.

pub mod bandwidth;
pub mod compat;
pub mod device;
pub mod driver;
pub mod error;
pub mod options;
pub mod results;
pub mod timer;

pub use bandwidth::{bandwidth_gbps, TimingError};
pub use compat::{is_sentinel, SENTINEL_VALUE, UNMEASURED_METRICS};
pub use device::{
    DeviceBufferHandle, DeviceError, DeviceSubstrate, HostOffload, HostOffloadBuilder, Retention,
    TransferStats,
};
pub use driver::{DeviceMemoryBenchmark, PassPhase, RunReport, READ_METRIC, WRITE_METRIC};
pub use error::{EngineError, ErrorKind, Result};
pub use options::{
    OptionDatabase, OptionError, OptionSource, OptionValue, RunConfig, DEFAULT_PASSES, OPT_PASSES,
    OPT_QUIET, OPT_VERBOSE,
};
pub use results::{MeasurementRecord, ResultDatabase, ResultSink, ResultSummary, SummaryStats};
pub use timer::{Timer, TimerError, TimerHandle, TimerService, TimingRecord};
