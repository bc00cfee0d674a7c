//! Fork-join worker pool for the streaming kernels.
//!
//! Each call to [`WorkerPool::fork_join`] builds a fresh [`rayon::ThreadPool`]
//! with exactly `thread_count` threads, forks one task per slice of the
//! [`SliceLayout`], and joins all of them before returning. Nothing persists
//! between invocations.

use devmem_common::BenchmarkConstants;
use tracing::trace;

use crate::error::Result;
use crate::layout::SliceLayout;

/// Configuration for [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Prefix for worker thread names (e.g. `"devmem-worker"`).
    pub name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { name_prefix: "devmem-worker".to_string() }
    }
}

/// The slice handed to one worker.
#[derive(Debug)]
pub struct WorkerSlice<'a> {
    /// Worker index; also the slice index in the layout.
    pub index: usize,
    /// The worker's private, disjoint slice of the buffer.
    pub data: &'a mut [f32],
}

/// Spawns one worker per slice of a [`SliceLayout`] and joins them.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    layout: SliceLayout,
    config: WorkerPoolConfig,
}

impl WorkerPool {
    pub fn new(layout: SliceLayout, config: WorkerPoolConfig) -> Self {
        Self { layout, config }
    }

    /// Pool with default thread naming for the given layout.
    pub fn with_layout(layout: SliceLayout) -> Self {
        Self::new(layout, WorkerPoolConfig::default())
    }

    /// Pool shaped by the run constants.
    pub fn from_constants(constants: &BenchmarkConstants) -> Result<Self> {
        Ok(Self::with_layout(SliceLayout::from_constants(constants)?))
    }

    pub fn layout(&self) -> &SliceLayout {
        &self.layout
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Run `f` once per slice of `data` in parallel and collect the results
    /// in slice order.
    ///
    /// Returns only after every worker has finished. A panicking worker
    /// propagates its panic to the caller after the join.
    ///
    /// # Errors
    ///
    /// Fails when `data` does not match the layout or the pool threads
    /// cannot be created.
    pub fn fork_join<T, F>(&self, data: &mut [f32], f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(WorkerSlice<'_>) -> T + Sync,
    {
        self.layout.check(data.len())?;

        let prefix = self.config.name_prefix.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.layout.thread_count())
            .thread_name(move |idx| format!("{prefix}-{idx}"))
            .build()?;

        let mut results: Vec<Option<T>> = Vec::with_capacity(self.layout.thread_count());
        results.resize_with(self.layout.thread_count(), || None);

        trace!(workers = self.layout.thread_count(), "forking workers");
        pool.scope(|s| {
            let f = &f;
            let slices = data.chunks_exact_mut(self.layout.elements_per_thread());
            for ((index, data), out) in slices.enumerate().zip(results.iter_mut()) {
                s.spawn(move |_| {
                    *out = Some(f(WorkerSlice { index, data }));
                });
            }
        });
        trace!(workers = self.layout.thread_count(), "joined workers");

        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn every_worker_runs_once_in_slice_order() {
        let pool = WorkerPool::with_layout(SliceLayout::new(4, 10).unwrap());
        let mut data = vec![0.0f32; 40];
        let indices = pool.fork_join(&mut data, |w| w.index).unwrap();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn workers_see_disjoint_slices() {
        let pool = WorkerPool::with_layout(SliceLayout::new(5, 7).unwrap());
        let mut data = vec![0.0f32; 35];
        pool.fork_join(&mut data, |w| w.data.fill(w.index as f32)).unwrap();
        for (i, chunk) in data.chunks(7).enumerate() {
            assert!(chunk.iter().all(|&x| x == i as f32), "slice {i} was touched by another worker");
        }
    }

    #[test]
    fn workers_run_on_named_pool_threads() {
        let config = WorkerPoolConfig { name_prefix: "bw-test".into() };
        let pool = WorkerPool::new(SliceLayout::new(3, 2).unwrap(), config);
        let names = Mutex::new(HashSet::new());
        let mut data = vec![0.0f32; 6];
        pool.fork_join(&mut data, |_| {
            let name = std::thread::current().name().unwrap_or_default().to_string();
            names.lock().unwrap().insert(name);
        })
        .unwrap();
        let names = names.into_inner().unwrap();
        assert!(!names.is_empty());
        assert!(names.iter().all(|n| n.starts_with("bw-test-")), "{names:?}");
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let pool = WorkerPool::with_layout(SliceLayout::new(2, 4).unwrap());
        let mut data = vec![0.0f32; 7];
        assert!(pool.fork_join(&mut data, |_| ()).is_err());
    }
}
