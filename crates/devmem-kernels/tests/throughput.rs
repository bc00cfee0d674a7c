//! Relative throughput of the read and write kernels.
//!
//! Both kernels are credited with the same byte count per launch, and the
//! write kernel also reads every element, so a read kernel that runs far
//! slower than the write kernel is bound by arithmetic rather than memory.

use std::time::{Duration, Instant};

use devmem_kernels::{initialize, AlignedBuffer, ReadKernel, SliceLayout, WorkerPool, WriteKernel};

const PER_THREAD: usize = 256 * 1024;
const REPS: u32 = 20;
const RUNS: usize = 5;

fn best_of(runs: usize, mut f: impl FnMut()) -> Duration {
    f();
    (0..runs)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .min()
        .unwrap()
}

#[test]
#[cfg_attr(debug_assertions, ignore = "timing is only meaningful in optimized builds")]
fn read_keeps_pace_with_write() {
    let threads = std::thread::available_parallelism().map_or(1, |n| n.get()).min(4);
    let layout = SliceLayout::new(threads, PER_THREAD).unwrap();
    let mut buf = AlignedBuffer::zeroed(layout.total_elements());
    initialize(&mut buf);

    let read = ReadKernel::new(WorkerPool::with_layout(layout), REPS);
    let write = WriteKernel::new(WorkerPool::with_layout(layout), REPS, 1.0);

    let read_time = best_of(RUNS, || {
        read.run(&mut buf).unwrap();
    });
    let write_time = best_of(RUNS, || {
        write.run(&mut buf).unwrap();
    });

    println!("read={read_time:?} write={write_time:?} threads={threads}");
    assert!(
        read_time <= write_time * 2,
        "read kernel is compute bound: read={read_time:?} write={write_time:?}"
    );
}
