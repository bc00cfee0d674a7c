//! Kernel error types.

use thiserror::Error;

/// Errors produced while preparing or launching a streaming kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("buffer holds {actual} elements but the slice layout covers {expected}")]
    LayoutMismatch { expected: usize, actual: usize },

    #[error("invalid slice layout: {0}")]
    InvalidLayout(String),

    #[error("kernel requires a non-empty buffer")]
    EmptyBuffer,

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, KernelError>;
