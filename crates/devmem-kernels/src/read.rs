//! Streaming read kernel.
//!
//! Every worker sums its slice `repetitions` times into a private
//! accumulator, adding [`READ_SWEEP_OFFSET`] after each sweep, then folds
//! that accumulator into one shared total inside a critical section.
//!
//! A sweep keeps [`READ_LANES`] independent partial sums so the adds do not
//! form one serial dependency chain and the loop can vectorize.

use std::hint::black_box;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::pool::WorkerPool;
use crate::DeviceKernel;

/// Added to a worker's running sum after each full sweep of its slice.
pub const READ_SWEEP_OFFSET: f32 = 1.0;

/// Independent partial sums kept per sweep (one cache line of `f32`).
pub const READ_LANES: usize = 16;

fn sweep(slice: &[f32]) -> f32 {
    let mut lanes = [0.0f32; READ_LANES];
    let mut chunks = slice.chunks_exact(READ_LANES);
    for chunk in &mut chunks {
        for (lane, &x) in lanes.iter_mut().zip(chunk) {
            *lane += x;
        }
    }
    let tail: f32 = chunks.remainder().iter().sum();
    lanes.iter().sum::<f32>() + tail
}

/// Result of one read-kernel launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadOutcome {
    /// Sum of every worker's contribution. Only kept alive so the reads
    /// cannot be eliminated; the value carries no meaning.
    pub sum: f32,
    /// Number of workers that folded into the shared total.
    pub contributions: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    sum: f32,
    contributions: usize,
}

/// Shared total updated by one worker at a time.
#[derive(Debug, Default)]
struct SharedAccumulator {
    inner: Mutex<Accumulator>,
}

impl SharedAccumulator {
    fn contribute(&self, partial: f32) {
        let mut acc = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        acc.sum += partial;
        acc.contributions += 1;
    }

    fn into_outcome(self) -> ReadOutcome {
        let acc = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        ReadOutcome { sum: acc.sum, contributions: acc.contributions }
    }
}

/// Generates sustained read traffic over a staged buffer.
#[derive(Debug, Clone)]
pub struct ReadKernel {
    pool: WorkerPool,
    repetitions: u32,
}

impl ReadKernel {
    pub fn new(pool: WorkerPool, repetitions: u32) -> Self {
        Self { pool, repetitions }
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Launch the kernel and report both the total and the contribution count.
    pub fn run(&self, data: &mut [f32]) -> Result<ReadOutcome> {
        let shared = SharedAccumulator::default();
        let repetitions = self.repetitions;

        self.pool.fork_join(data, |worker| {
            let slice: &[f32] = worker.data;
            let mut b = 0.0f32;
            for _ in 0..repetitions {
                b += sweep(black_box(slice));
                b += READ_SWEEP_OFFSET;
            }
            shared.contribute(b);
        })?;

        Ok(black_box(shared.into_outcome()))
    }
}

impl DeviceKernel for ReadKernel {
    fn name(&self) -> &'static str {
        "stream_read"
    }

    fn launch(&self, data: &mut [f32]) -> Result<f32> {
        self.run(data).map(|outcome| outcome.sum)
    }
}
