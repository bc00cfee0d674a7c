//! Engine error taxonomy.

use devmem_common::ConfigError;
use devmem_kernels::KernelError;
use thiserror::Error;

use crate::bandwidth::TimingError;
use crate::device::DeviceError;
use crate::driver::PassPhase;
use crate::options::OptionError;
use crate::timer::TimerError;

/// Broad class of a run failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid options or constants; raised before any measurement.
    Configuration,
    /// Staging, execution, or release failed.
    Device,
    /// A timed section could not be turned into a bandwidth figure.
    Timing,
}

/// Errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid benchmark constants: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid run options: {0}")]
    Option(#[from] OptionError),

    #[error("failed to set up kernels: {0}")]
    KernelSetup(#[from] KernelError),

    #[error("pass {pass}: device failure during {phase}")]
    Device {
        pass: u32,
        phase: PassPhase,
        #[source]
        source: DeviceError,
    },

    #[error("failed to release device buffer")]
    Release {
        #[source]
        source: DeviceError,
    },

    #[error("pass {pass}: timer failure during {phase}")]
    Timer {
        pass: u32,
        phase: PassPhase,
        #[source]
        source: TimerError,
    },

    #[error("pass {pass}: timing anomaly during {phase}")]
    Timing {
        pass: u32,
        phase: PassPhase,
        #[source]
        source: TimingError,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Option(_) | Self::KernelSetup(_) => ErrorKind::Configuration,
            Self::Device { .. } | Self::Release { .. } => ErrorKind::Device,
            Self::Timer { .. } | Self::Timing { .. } => ErrorKind::Timing,
        }
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, EngineError>;
