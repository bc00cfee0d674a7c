//! Cache-line aligned `f32` storage for work buffers.
//!
//! The backing store is a vector of 64-byte cache lines, so the first
//! element always starts on a 64-byte boundary and the kernels can stream
//! whole lines. The logical length may end mid-line; the tail of the last
//! line is padding that is never exposed.

use std::fmt;
use std::ops::{Deref, DerefMut};

use bytemuck::{Pod, Zeroable};

use crate::error::{KernelError, Result};

/// Alignment of every [`AlignedBuffer`] in bytes.
pub const BUFFER_ALIGNMENT: usize = 64;

const LANES: usize = BUFFER_ALIGNMENT / std::mem::size_of::<f32>();

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
struct CacheLine([f32; LANES]);

/// A contiguous, 64-byte aligned array of `f32` elements.
#[derive(Clone)]
pub struct AlignedBuffer {
    lines: Vec<CacheLine>,
    len: usize,
}

impl AlignedBuffer {
    /// Allocate `len` zeroed elements.
    pub fn zeroed(len: usize) -> Self {
        Self { lines: vec![CacheLine::zeroed(); len.div_ceil(LANES)], len }
    }

    /// Allocate a buffer holding a copy of `src`.
    pub fn from_slice(src: &[f32]) -> Self {
        let mut buf = Self::zeroed(src.len());
        buf.as_mut_slice().copy_from_slice(src);
        buf
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the logical contents in bytes.
    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<f32>()
    }

    /// View the elements.
    pub fn as_slice(&self) -> &[f32] {
        &bytemuck::cast_slice::<CacheLine, f32>(&self.lines)[..self.len]
    }

    /// View the elements mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut bytemuck::cast_slice_mut::<CacheLine, f32>(&mut self.lines)[..self.len]
    }

    /// Overwrite every element with the contents of `src`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::LayoutMismatch`] when the lengths differ.
    pub fn copy_from(&mut self, src: &[f32]) -> Result<()> {
        if src.len() != self.len {
            return Err(KernelError::LayoutMismatch { expected: self.len, actual: src.len() });
        }
        self.as_mut_slice().copy_from_slice(src);
        Ok(())
    }
}

impl Deref for AlignedBuffer {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        self.as_slice()
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [f32] {
        self.as_mut_slice()
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("alignment", &BUFFER_ALIGNMENT)
            .finish()
    }
}
