//! Device transfer and execution substrate.
//!
//! [`DeviceSubstrate`] is the three-operation contract the pass driver uses:
//! stage a host buffer into device memory, execute a kernel against the
//! resident copy, release it. [`HostOffload`] implements it in-process by
//! keeping each resident buffer in its own aligned allocation.

use std::collections::HashMap;

use devmem_kernels::{AlignedBuffer, DeviceKernel, KernelError};
use thiserror::Error;

/// Identifies a device-resident buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceBufferHandle(u64);

impl DeviceBufferHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Whether a staged copy outlives the `stage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// Keep the device copy alive until it is released.
    #[default]
    Retain,
    /// Free the device copy when `stage` returns.
    Transient,
}

/// Errors from the device substrate.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The handle was never staged or has been released.
    #[error("device buffer {handle} is not resident")]
    UnknownBuffer { handle: u64 },

    /// Device memory is exhausted.
    #[error("device memory exhausted: requested {requested_bytes} bytes, {available_bytes} available")]
    OutOfMemory { requested_bytes: u64, available_bytes: u64 },

    /// Staging into an existing slot with a different element count.
    #[error("staging {host_len} elements into a resident buffer of {device_len}")]
    SizeMismatch { host_len: usize, device_len: usize },

    /// The kernel failed on the device.
    #[error("kernel '{kernel}' failed")]
    Kernel {
        kernel: &'static str,
        #[source]
        source: KernelError,
    },
}

/// Host → device transfer, execution, and release.
pub trait DeviceSubstrate {
    /// Copy `host` into device memory.
    ///
    /// With `slot`, the copy overwrites that resident buffer in place and the
    /// same handle is returned; otherwise a new allocation is made.
    fn stage(
        &mut self,
        host: &[f32],
        slot: Option<DeviceBufferHandle>,
        retention: Retention,
    ) -> Result<DeviceBufferHandle, DeviceError>;

    /// Run `kernel` against the resident copy and block until it completes.
    fn execute(
        &mut self,
        handle: DeviceBufferHandle,
        kernel: &dyn DeviceKernel,
    ) -> Result<f32, DeviceError>;

    /// Free the device allocation. The host buffer is unaffected.
    fn release(&mut self, handle: DeviceBufferHandle) -> Result<(), DeviceError>;
}

/// Transfer counters kept by [`HostOffload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub stages: u64,
    pub allocations: u64,
    pub bytes_staged: u64,
    pub executions: u64,
    pub releases: u64,
}

/// Builder for [`HostOffload`].
#[derive(Debug, Default)]
pub struct HostOffloadBuilder {
    memory_limit_bytes: Option<u64>,
}

impl HostOffloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap resident memory. `0` means unlimited.
    pub fn memory_limit_bytes(mut self, limit: u64) -> Self {
        self.memory_limit_bytes = (limit > 0).then_some(limit);
        self
    }

    pub fn build(self) -> HostOffload {
        tracing::debug!(memory_limit_bytes = ?self.memory_limit_bytes, "creating host offload device");
        HostOffload {
            memory_limit_bytes: self.memory_limit_bytes,
            resident: HashMap::new(),
            next_id: 0,
            stats: TransferStats::default(),
        }
    }
}

/// In-process device: each resident buffer is a separate 64-byte aligned
/// allocation.
#[derive(Debug)]
pub struct HostOffload {
    memory_limit_bytes: Option<u64>,
    resident: HashMap<u64, AlignedBuffer>,
    next_id: u64,
    stats: TransferStats,
}

impl Default for HostOffload {
    fn default() -> Self {
        HostOffloadBuilder::new().build()
    }
}

impl HostOffload {
    pub fn builder() -> HostOffloadBuilder {
        HostOffloadBuilder::new()
    }

    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// Number of live device allocations.
    pub fn resident_buffers(&self) -> usize {
        self.resident.len()
    }

    /// Bytes currently held in device memory.
    pub fn resident_bytes(&self) -> u64 {
        self.resident.values().map(|b| b.size_bytes() as u64).sum()
    }

    /// Read-only view of a resident buffer.
    pub fn resident(&self, handle: DeviceBufferHandle) -> Option<&[f32]> {
        self.resident.get(&handle.0).map(AlignedBuffer::as_slice)
    }

    fn allocate(&mut self, host: &[f32]) -> Result<u64, DeviceError> {
        let requested_bytes = std::mem::size_of_val(host) as u64;
        if let Some(limit) = self.memory_limit_bytes {
            let available_bytes = limit.saturating_sub(self.resident_bytes());
            if requested_bytes > available_bytes {
                return Err(DeviceError::OutOfMemory { requested_bytes, available_bytes });
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        self.resident.insert(id, AlignedBuffer::from_slice(host));
        self.stats.allocations += 1;
        Ok(id)
    }
}

impl DeviceSubstrate for HostOffload {
    fn stage(
        &mut self,
        host: &[f32],
        slot: Option<DeviceBufferHandle>,
        retention: Retention,
    ) -> Result<DeviceBufferHandle, DeviceError> {
        let id = match slot {
            Some(DeviceBufferHandle(id)) => {
                let device = self
                    .resident
                    .get_mut(&id)
                    .ok_or(DeviceError::UnknownBuffer { handle: id })?;
                if device.len() != host.len() {
                    return Err(DeviceError::SizeMismatch {
                        host_len: host.len(),
                        device_len: device.len(),
                    });
                }
                device.as_mut_slice().copy_from_slice(host);
                id
            }
            None => self.allocate(host)?,
        };

        self.stats.stages += 1;
        self.stats.bytes_staged += std::mem::size_of_val(host) as u64;
        tracing::debug!(handle = id, elements = host.len(), ?retention, "staged buffer");

        if retention == Retention::Transient {
            self.release(DeviceBufferHandle(id))?;
        }
        Ok(DeviceBufferHandle(id))
    }

    fn execute(
        &mut self,
        handle: DeviceBufferHandle,
        kernel: &dyn DeviceKernel,
    ) -> Result<f32, DeviceError> {
        let device = self
            .resident
            .get_mut(&handle.0)
            .ok_or(DeviceError::UnknownBuffer { handle: handle.0 })?;
        let value = kernel
            .launch(device.as_mut_slice())
            .map_err(|source| DeviceError::Kernel { kernel: kernel.name(), source })?;
        self.stats.executions += 1;
        Ok(value)
    }

    fn release(&mut self, handle: DeviceBufferHandle) -> Result<(), DeviceError> {
        self.resident.remove(&handle.0).ok_or(DeviceError::UnknownBuffer { handle: handle.0 })?;
        self.stats.releases += 1;
        tracing::debug!(handle = handle.0, "released device buffer");
        Ok(())
    }
}
