//! Multi-pass measurement loop.
//!
//! Each pass re-initializes the host buffer, stages it on the device and
//! times the read kernel, then does the same for the write kernel. Staging
//! always happens outside the timed interval. After the last pass (or the
//! first failure) the device copy is released.

use std::fmt;

use devmem_common::{size_label, BenchmarkConstants, BANDWIDTH_UNIT};
use devmem_kernels::{
    initialize, AlignedBuffer, DeviceKernel, ReadKernel, SliceLayout, WorkerPool, WriteKernel,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bandwidth::bandwidth_gbps;
use crate::compat::{unmeasured_records, UNMEASURED_METRICS};
use crate::device::{DeviceBufferHandle, DeviceSubstrate, Retention};
use crate::error::{EngineError, Result};
use crate::options::{OptionSource, RunConfig};
use crate::results::{MeasurementRecord, ResultSink};
use crate::timer::Timer;

/// Metric reported for the read kernel.
pub const READ_METRIC: &str = "readGlobalMemoryCoalesced";
/// Metric reported for the write kernel.
pub const WRITE_METRIC: &str = "writeGlobalMemoryCoalesced";

/// Steps of a pass, in execution order, plus the terminal release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassPhase {
    InitForRead,
    StageForRead,
    TimeRead,
    RecordRead,
    InitForWrite,
    StageForWrite,
    TimeWrite,
    RecordWrite,
    RecordUnmeasured,
    ReleaseDeviceBuffer,
}

impl PassPhase {
    /// Phases one pass walks through.
    pub const PASS: [PassPhase; 9] = [
        Self::InitForRead,
        Self::StageForRead,
        Self::TimeRead,
        Self::RecordRead,
        Self::InitForWrite,
        Self::StageForWrite,
        Self::TimeWrite,
        Self::RecordWrite,
        Self::RecordUnmeasured,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitForRead => "INIT_FOR_READ",
            Self::StageForRead | Self::StageForWrite => "STAGE_ON_DEVICE",
            Self::TimeRead => "TIME_READ",
            Self::RecordRead => "RECORD_READ",
            Self::InitForWrite => "INIT_FOR_WRITE",
            Self::TimeWrite => "TIME_WRITE",
            Self::RecordWrite => "RECORD_WRITE",
            Self::RecordUnmeasured => "RECORD_UNMEASURED",
            Self::ReleaseDeviceBuffer => "RELEASE_DEVICE_BUFFER",
        }
    }
}

impl fmt::Display for PassPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub passes_completed: u32,
    pub records_emitted: usize,
    /// Bytes each timed kernel moves in one pass.
    pub bytes_per_kernel: f64,
    pub size_label: String,
    /// Read-kernel anti-optimization values, one per pass. Never validated.
    pub read_checksums: Vec<f32>,
    /// Write-kernel anti-optimization values, one per pass. Never validated.
    pub write_checksums: Vec<f32>,
}

/// Everything one pass produced, held back until the pass completes.
struct PassOutput {
    records: Vec<MeasurementRecord>,
    read_checksum: f32,
    write_checksum: f32,
}

/// The pass driver.
pub struct DeviceMemoryBenchmark<D, T> {
    constants: BenchmarkConstants,
    layout: SliceLayout,
    read: ReadKernel,
    write: WriteKernel,
    device: D,
    timer: T,
}

impl<D: DeviceSubstrate, T: Timer> DeviceMemoryBenchmark<D, T> {
    /// Validate `constants` and prepare both kernels.
    pub fn new(constants: BenchmarkConstants, device: D, timer: T) -> Result<Self> {
        constants.validate()?;
        let pool = WorkerPool::from_constants(&constants)?;
        let layout = *pool.layout();
        let read = ReadKernel::new(pool.clone(), constants.repetitions_per_pass);
        let write = WriteKernel::new(pool, constants.repetitions_per_pass, constants.write_base_value);
        Ok(Self { constants, layout, read, write, device, timer })
    }

    pub fn constants(&self) -> &BenchmarkConstants {
        &self.constants
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn into_parts(self) -> (D, T) {
        (self.device, self.timer)
    }

    /// Run every pass, appending each completed pass's records to `sink`.
    ///
    /// # Errors
    ///
    /// Invalid options fail before anything is allocated. Any device, timer,
    /// or timing failure aborts the run; records from earlier passes stay in
    /// `sink`, the failing pass contributes none. The device buffer is
    /// released on every path once it has been staged.
    pub fn run(&mut self, options: &dyn OptionSource, sink: &mut dyn ResultSink) -> Result<RunReport> {
        let run = RunConfig::from_options(options)?;
        let bytes = self.constants.bytes_moved_per_kernel();
        let label = size_label(bytes);

        if run.verbose {
            info!(
                elements_per_thread = self.constants.elements_per_thread,
                repetitions_per_pass = self.constants.repetitions_per_pass,
                thread_count = self.constants.thread_count,
                bytes_per_test = bytes,
                size = %label,
                "test parameters"
            );
        }

        let mut report = RunReport {
            passes_completed: 0,
            records_emitted: 0,
            bytes_per_kernel: bytes,
            size_label: label,
            read_checksums: Vec::new(),
            write_checksums: Vec::new(),
        };

        let mut host = AlignedBuffer::zeroed(self.layout.total_elements());
        let mut slot = None;
        let outcome = self.run_passes(&run, &mut host, &mut slot, sink, &mut report);

        let released = match slot {
            Some(handle) => {
                debug!(phase = %PassPhase::ReleaseDeviceBuffer, handle = handle.id());
                self.device.release(handle).map_err(|source| EngineError::Release { source })
            }
            None => Ok(()),
        };

        match (outcome, released) {
            (Ok(()), Ok(())) => Ok(report),
            (Ok(()), Err(err)) | (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!(error = %release_err, "device buffer release failed after run error");
                Err(err)
            }
        }
    }

    fn run_passes(
        &mut self,
        run: &RunConfig,
        host: &mut AlignedBuffer,
        slot: &mut Option<DeviceBufferHandle>,
        sink: &mut dyn ResultSink,
        report: &mut RunReport,
    ) -> Result<()> {
        for pass in 1..=run.passes {
            info!(pass, passes = run.passes, "running benchmarks");
            let output = self.run_pass(pass, run, host, slot, &report.size_label)?;

            report.records_emitted += output.records.len();
            for record in output.records {
                sink.add_result(record);
            }
            report.read_checksums.push(output.read_checksum);
            report.write_checksums.push(output.write_checksum);
            report.passes_completed = pass;
        }
        Ok(())
    }

    fn run_pass(
        &mut self,
        pass: u32,
        run: &RunConfig,
        host: &mut AlignedBuffer,
        slot: &mut Option<DeviceBufferHandle>,
        label: &str,
    ) -> Result<PassOutput> {
        let Self { constants, read, write, device, timer, .. } = self;
        let bytes = constants.bytes_moved_per_kernel();
        let mut records = Vec::with_capacity(2 + UNMEASURED_METRICS.len());
        let mut checksums = [0.0f32; 2];

        let steps = [KernelStep::read(&*read), KernelStep::write(&*write)];
        for (step, checksum) in steps.iter().zip(checksums.iter_mut()) {
            let kernel = step.kernel;

            debug!(pass, phase = %step.init);
            initialize(host);

            debug!(pass, phase = %step.stage);
            let handle = device
                .stage(host, *slot, Retention::Retain)
                .map_err(|source| EngineError::Device { pass, phase: step.stage, source })?;
            *slot = Some(handle);

            debug!(pass, phase = %step.time, kernel = kernel.name());
            let started = timer.start();
            let value = device
                .execute(handle, kernel)
                .map_err(|source| EngineError::Device { pass, phase: step.time, source })?;
            let seconds = timer
                .stop(started, kernel.name())
                .map_err(|source| EngineError::Timer { pass, phase: step.time, source })?;
            if run.verbose {
                info!(pass, label = kernel.name(), seconds, "kernel timing");
            }

            debug!(pass, phase = %step.record);
            let gbps = bandwidth_gbps(bytes, seconds)
                .map_err(|source| EngineError::Timing { pass, phase: step.time, source })?;
            records.push(MeasurementRecord::new(step.metric, label, BANDWIDTH_UNIT, gbps));
            *checksum = value;
        }

        debug!(pass, phase = %PassPhase::RecordUnmeasured);
        records.extend(unmeasured_records(label));

        Ok(PassOutput { records, read_checksum: checksums[0], write_checksum: checksums[1] })
    }
}

/// Phases and reporting for one timed kernel within a pass.
struct KernelStep<'k> {
    init: PassPhase,
    stage: PassPhase,
    time: PassPhase,
    record: PassPhase,
    kernel: &'k dyn DeviceKernel,
    metric: &'static str,
}

impl<'k> KernelStep<'k> {
    fn read(kernel: &'k ReadKernel) -> Self {
        Self {
            init: PassPhase::InitForRead,
            stage: PassPhase::StageForRead,
            time: PassPhase::TimeRead,
            record: PassPhase::RecordRead,
            kernel,
            metric: READ_METRIC,
        }
    }

    fn write(kernel: &'k WriteKernel) -> Self {
        Self {
            init: PassPhase::InitForWrite,
            stage: PassPhase::StageForWrite,
            time: PassPhase::TimeWrite,
            record: PassPhase::RecordWrite,
            kernel,
            metric: WRITE_METRIC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_labels() {
        let labels: Vec<_> = PassPhase::PASS.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            labels,
            [
                "INIT_FOR_READ",
                "STAGE_ON_DEVICE",
                "TIME_READ",
                "RECORD_READ",
                "INIT_FOR_WRITE",
                "STAGE_ON_DEVICE",
                "TIME_WRITE",
                "RECORD_WRITE",
                "RECORD_UNMEASURED",
            ]
        );
        assert_eq!(PassPhase::ReleaseDeviceBuffer.to_string(), "RELEASE_DEVICE_BUFFER");
    }

    #[test]
    fn phases_serialize_screaming_snake() {
        let json = serde_json::to_string(&PassPhase::TimeWrite).unwrap();
        assert_eq!(json, "\"TIME_WRITE\"");
    }
}
