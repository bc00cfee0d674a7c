//! Streaming write kernel.
//!
//! Worker `i` starts from the seed `base_value + i` and adds it into every
//! element of its slice, bumping the seed by one after each sweep. Each
//! element therefore receives `Σ_{k=0}^{reps-1} (base_value + i + k)`.

use std::hint::black_box;

use crate::error::{KernelError, Result};
use crate::pool::WorkerPool;
use crate::DeviceKernel;

/// Generates sustained read-modify-write traffic over a staged buffer.
#[derive(Debug, Clone)]
pub struct WriteKernel {
    pool: WorkerPool,
    repetitions: u32,
    base_value: f32,
}

impl WriteKernel {
    pub fn new(pool: WorkerPool, repetitions: u32, base_value: f32) -> Self {
        Self { pool, repetitions, base_value }
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn base_value(&self) -> f32 {
        self.base_value
    }

    /// Seed used by `worker` on its first sweep.
    #[allow(clippy::cast_precision_loss)]
    pub fn seed_for(&self, worker: usize) -> f32 {
        self.base_value + worker as f32
    }

    /// Launch the kernel; returns `data[0] + data[len - 1]` read back after
    /// the join. The value is never checked and only defeats dead-store
    /// elimination.
    pub fn run(&self, data: &mut [f32]) -> Result<f32> {
        let repetitions = self.repetitions;

        self.pool.fork_join(data, |worker| {
            let mut write_data = self.seed_for(worker.index);
            for _ in 0..repetitions {
                for x in worker.data.iter_mut() {
                    *x += write_data;
                }
                write_data += 1.0;
            }
            black_box(&*worker.data);
        })?;

        let (Some(first), Some(last)) = (data.first(), data.last()) else {
            return Err(KernelError::EmptyBuffer);
        };
        Ok(black_box(first + last))
    }
}

impl DeviceKernel for WriteKernel {
    fn name(&self) -> &'static str {
        "stream_write"
    }

    fn launch(&self, data: &mut [f32]) -> Result<f32> {
        self.run(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SliceLayout;

    fn kernel(threads: usize, per_thread: usize, reps: u32, base: f32) -> WriteKernel {
        WriteKernel::new(
            WorkerPool::with_layout(SliceLayout::new(threads, per_thread).unwrap()),
            reps,
            base,
        )
    }

    #[test]
    fn thread_zero_adds_six_after_three_reps() {
        let k = kernel(1, 8, 3, 1.0);
        let mut data = vec![0.0f32; 8];
        k.run(&mut data).unwrap();
        assert!(data.iter().all(|&x| x == 6.0));
    }

    #[test]
    fn seeds_distinguish_threads() {
        // worker i adds (1+i) + (2+i) + (3+i) = 6 + 3i on top of the initial 1.0
        let k = kernel(4, 5, 3, 1.0);
        let mut data = vec![1.0f32; 20];
        k.run(&mut data).unwrap();
        for (i, chunk) in data.chunks(5).enumerate() {
            let expected = 1.0 + 6.0 + 3.0 * i as f32;
            assert!(chunk.iter().all(|&x| x == expected), "worker {i}: {chunk:?}");
        }
    }

    #[test]
    fn returns_first_plus_last() {
        let k = kernel(2, 3, 1, 1.0);
        let mut data = vec![0.0f32; 6];
        let checksum = k.run(&mut data).unwrap();
        // worker 0 adds 1.0, worker 1 adds 2.0
        assert_eq!(checksum, 1.0 + 2.0);
    }

    #[test]
    fn single_element_buffer_counts_it_twice() {
        let k = kernel(1, 1, 2, 1.0);
        let mut data = vec![0.0f32; 1];
        let checksum = k.run(&mut data).unwrap();
        assert_eq!(data[0], 3.0);
        assert_eq!(checksum, 6.0);
    }

    #[test]
    fn launch_goes_through_trait() {
        let k = kernel(2, 2, 1, 0.5);
        let mut data = vec![0.0f32; 4];
        assert_eq!(k.launch(&mut data).unwrap(), 0.5 + 1.5);
        assert_eq!(k.name(), "stream_write");
    }
}
