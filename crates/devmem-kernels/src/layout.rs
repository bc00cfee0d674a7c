//! Static partitioning of a work buffer into per-thread slices.
//!
//! Thread `i` always owns `[i * elements_per_thread, (i + 1) * elements_per_thread)`.
//! Slices are disjoint, contiguous, and together cover the whole buffer.

use std::ops::Range;

use devmem_common::BenchmarkConstants;

use crate::error::{KernelError, Result};

/// Shape of the per-thread partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceLayout {
    thread_count: usize,
    elements_per_thread: usize,
}

impl SliceLayout {
    /// Build a layout, rejecting empty slices, zero threads, and overflow.
    pub fn new(thread_count: usize, elements_per_thread: usize) -> Result<Self> {
        if thread_count == 0 {
            return Err(KernelError::InvalidLayout("thread_count must be > 0".into()));
        }
        if elements_per_thread == 0 {
            return Err(KernelError::InvalidLayout("elements_per_thread must be > 0".into()));
        }
        if elements_per_thread.checked_mul(thread_count).is_none() {
            return Err(KernelError::InvalidLayout(format!(
                "{thread_count} threads * {elements_per_thread} elements overflows usize"
            )));
        }
        Ok(Self { thread_count, elements_per_thread })
    }

    /// Layout described by the run constants.
    pub fn from_constants(constants: &BenchmarkConstants) -> Result<Self> {
        Self::new(constants.thread_count, constants.elements_per_thread)
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn elements_per_thread(&self) -> usize {
        self.elements_per_thread
    }

    /// Length of the whole buffer.
    pub fn total_elements(&self) -> usize {
        self.thread_count * self.elements_per_thread
    }

    /// Element range owned by `thread_index`, or `None` past the last thread.
    pub fn slice_range(&self, thread_index: usize) -> Option<Range<usize>> {
        (thread_index < self.thread_count).then(|| {
            let start = thread_index * self.elements_per_thread;
            start..start + self.elements_per_thread
        })
    }

    /// Every thread's range, in thread order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.thread_count).filter_map(|i| self.slice_range(i))
    }

    /// Ensure a buffer of `len` elements matches this layout exactly.
    pub fn check(&self, len: usize) -> Result<()> {
        let expected = self.total_elements();
        if len == expected {
            Ok(())
        } else {
            Err(KernelError::LayoutMismatch { expected, actual: len })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous() {
        let layout = SliceLayout::new(4, 100).unwrap();
        let ranges: Vec<_> = layout.ranges().collect();
        assert_eq!(ranges, vec![0..100, 100..200, 200..300, 300..400]);
    }

    #[test]
    fn slice_range_past_end_is_none() {
        let layout = SliceLayout::new(3, 5).unwrap();
        assert_eq!(layout.slice_range(2), Some(10..15));
        assert_eq!(layout.slice_range(3), None);
    }

    #[test]
    fn rejects_degenerate_shapes() {
        assert!(SliceLayout::new(0, 10).is_err());
        assert!(SliceLayout::new(10, 0).is_err());
        assert!(SliceLayout::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn check_reports_both_lengths() {
        let layout = SliceLayout::new(2, 8).unwrap();
        assert!(layout.check(16).is_ok());
        let err = layout.check(15).unwrap_err();
        assert_eq!(err.to_string(), "buffer holds 15 elements but the slice layout covers 16");
    }

    #[test]
    fn from_constants_uses_thread_and_slice_size() {
        let constants = BenchmarkConstants {
            thread_count: 6,
            elements_per_thread: 32,
            ..BenchmarkConstants::default()
        };
        let layout = SliceLayout::from_constants(&constants).unwrap();
        assert_eq!(layout.total_elements(), 192);
    }
}
