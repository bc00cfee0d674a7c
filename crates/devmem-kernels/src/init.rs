//! Buffer initializer run before every measured phase.

use rayon::prelude::*;

/// Value every element holds after [`initialize`].
pub const INIT_VALUE: f32 = 1.0;

const INIT_CHUNK: usize = 16 * 1024;

/// Set every element of `buf` to [`INIT_VALUE`].
///
/// Chunks are filled in parallel with no dependency between elements. An
/// empty buffer is a no-op, and calling this twice leaves the same state
/// as calling it once.
pub fn initialize(buf: &mut [f32]) {
    buf.par_chunks_mut(INIT_CHUNK).for_each(|chunk| chunk.fill(INIT_VALUE));
}
