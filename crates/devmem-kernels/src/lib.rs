//! Streaming memory kernels for the devmem bandwidth benchmark.
//!
//! The kernels operate on a flat `f32` buffer that is statically split into
//! one contiguous slice per worker ([`SliceLayout`]). [`ReadKernel`] and
//! [`WriteKernel`] fork a fresh set of workers per launch through
//! [`WorkerPool`] and join them before returning.

pub mod buffer;
pub mod error;
pub mod init;
pub mod layout;
pub mod pool;
pub mod read;
pub mod write;

pub use buffer::{AlignedBuffer, BUFFER_ALIGNMENT};
pub use error::{KernelError, Result};
pub use init::{initialize, INIT_VALUE};
pub use layout::SliceLayout;
pub use pool::{WorkerPool, WorkerPoolConfig, WorkerSlice};
pub use read::{ReadKernel, ReadOutcome, READ_LANES, READ_SWEEP_OFFSET};
pub use write::WriteKernel;

/// A kernel that runs against device-resident memory.
///
/// The device substrate hands the kernel its resident copy of the buffer and
/// blocks until `launch` returns.
pub trait DeviceKernel: Send + Sync {
    /// Stable identifier, also used as the timer label.
    fn name(&self) -> &'static str;

    /// Execute over `data` and return the kernel's anti-optimization value.
    fn launch(&self, data: &mut [f32]) -> Result<f32>;
}
