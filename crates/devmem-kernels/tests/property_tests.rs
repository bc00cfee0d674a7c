//! Property tests for slice partitioning, initialization, and the kernels.

use devmem_kernels::{
    initialize, AlignedBuffer, ReadKernel, SliceLayout, WorkerPool, WriteKernel, BUFFER_ALIGNMENT,
    INIT_VALUE,
};
use proptest::prelude::*;

// ── Partitioning ─────────────────────────────────────────────────────────────

proptest! {
    /// Slices are pairwise disjoint and jointly cover `[0, total)` exactly.
    #[test]
    fn slices_partition_the_buffer(threads in 1usize..=64, per_thread in 1usize..=4096) {
        let layout = SliceLayout::new(threads, per_thread).unwrap();
        let ranges: Vec<_> = layout.ranges().collect();

        prop_assert_eq!(ranges.len(), threads);
        prop_assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), threads * per_thread);
        prop_assert_eq!(ranges.first().map(|r| r.start), Some(0));
        prop_assert_eq!(ranges.last().map(|r| r.end), Some(layout.total_elements()));
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

// ── Initializer ──────────────────────────────────────────────────────────────

proptest! {
    /// Every element equals the init value afterwards, for any length including 0.
    #[test]
    fn initialize_sets_every_element(values in proptest::collection::vec(-1e6f32..1e6, 0..5000)) {
        let mut buf = AlignedBuffer::from_slice(&values);
        initialize(&mut buf);
        prop_assert!(buf.iter().all(|&x| x == INIT_VALUE));
    }

    /// Initializing twice leaves the same state as initializing once.
    #[test]
    fn initialize_is_idempotent(len in 0usize..5000) {
        let mut once = AlignedBuffer::zeroed(len);
        initialize(&mut once);
        let mut twice = AlignedBuffer::zeroed(len);
        initialize(&mut twice);
        initialize(&mut twice);
        prop_assert_eq!(once.as_slice(), twice.as_slice());
    }

    /// Buffers stay 64-byte aligned regardless of length.
    #[test]
    fn buffers_are_cache_line_aligned(len in 1usize..10_000) {
        let buf = AlignedBuffer::zeroed(len);
        prop_assert_eq!(buf.as_ptr() as usize % BUFFER_ALIGNMENT, 0);
    }
}

// ── Kernels ──────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The shared accumulator receives exactly one contribution per worker.
    #[test]
    fn read_kernel_counts_each_worker_once(threads in 1usize..=16, per_thread in 1usize..=256, reps in 1u32..=4) {
        let layout = SliceLayout::new(threads, per_thread).unwrap();
        let kernel = ReadKernel::new(WorkerPool::with_layout(layout), reps);
        let mut buf = AlignedBuffer::zeroed(layout.total_elements());
        initialize(&mut buf);
        let outcome = kernel.run(&mut buf).unwrap();
        prop_assert_eq!(outcome.contributions, threads);
    }

    /// Each element of worker `i` gains `Σ_{k<R} (v0 + i + k)`.
    #[test]
    fn write_kernel_net_add_matches_formula(threads in 1usize..=8, per_thread in 1usize..=64, reps in 1u32..=6) {
        let layout = SliceLayout::new(threads, per_thread).unwrap();
        let kernel = WriteKernel::new(WorkerPool::with_layout(layout), reps, 1.0);
        let mut buf = AlignedBuffer::zeroed(layout.total_elements());
        kernel.run(&mut buf).unwrap();

        for (i, range) in layout.ranges().enumerate() {
            let expected: f32 = (0..reps).map(|k| 1.0 + i as f32 + k as f32).sum();
            prop_assert!(buf[range].iter().all(|&x| x == expected));
        }
    }
}
