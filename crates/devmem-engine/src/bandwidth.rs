//! Conversion from bytes moved and elapsed time to GB/s.

use devmem_common::GIGA;
use thiserror::Error;

/// A measurement that cannot be turned into a throughput figure.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimingError {
    #[error("elapsed time must be positive and finite, got {seconds} s")]
    NonPositiveElapsed { seconds: f64 },

    #[error("byte count must be finite and non-negative, got {bytes}")]
    InvalidByteCount { bytes: f64 },
}

/// Throughput in decimal gigabytes per second: `bytes / (seconds * 1e9)`.
///
/// A zero, negative, or non-finite elapsed time means the clock failed to
/// resolve the interval and is rejected rather than producing an infinite
/// or negative figure.
///
/// ```
/// use devmem_engine::bandwidth_gbps;
///
/// assert_eq!(bandwidth_gbps(1e9, 1.0).unwrap(), 1.0);
/// assert!(bandwidth_gbps(1e9, 0.0).is_err());
/// ```
pub fn bandwidth_gbps(bytes: f64, seconds: f64) -> Result<f64, TimingError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(TimingError::NonPositiveElapsed { seconds });
    }
    if !bytes.is_finite() || bytes < 0.0 {
        return Err(TimingError::InvalidByteCount { bytes });
    }
    Ok(bytes / (seconds * GIGA))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn one_gigabyte_per_second() {
        assert_eq!(bandwidth_gbps(1e9, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn zero_bytes_is_zero_throughput() {
        assert_eq!(bandwidth_gbps(0.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn zero_elapsed_is_an_error() {
        assert_eq!(
            bandwidth_gbps(16_000.0, 0.0),
            Err(TimingError::NonPositiveElapsed { seconds: 0.0 })
        );
    }

    #[test]
    fn negative_elapsed_is_an_error() {
        assert!(matches!(
            bandwidth_gbps(16_000.0, -1e-6),
            Err(TimingError::NonPositiveElapsed { .. })
        ));
    }

    #[test]
    fn nan_elapsed_is_an_error() {
        assert!(bandwidth_gbps(1.0, f64::NAN).is_err());
        assert!(bandwidth_gbps(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn negative_bytes_is_an_error() {
        assert!(matches!(bandwidth_gbps(-1.0, 1.0), Err(TimingError::InvalidByteCount { .. })));
    }

    proptest! {
        #[test]
        fn result_is_finite_and_non_negative(bytes in 0.0f64..1e15, seconds in 1e-9f64..1e3) {
            let bw = bandwidth_gbps(bytes, seconds).unwrap();
            prop_assert!(bw.is_finite());
            prop_assert!(bw >= 0.0);
        }

        #[test]
        fn non_positive_elapsed_always_fails(bytes in 0.0f64..1e15, seconds in -1e3f64..=0.0) {
            prop_assert!(bandwidth_gbps(bytes, seconds).is_err());
        }
    }
}
