//! Element size, throughput unit, and size-label helpers.

/// Bytes per buffer element (single-precision float).
pub const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();

/// Decimal giga used for throughput figures.
pub const GIGA: f64 = 1.0e9;

/// Unit attached to every bandwidth record.
pub const BANDWIDTH_UNIT: &str = "GB/s";

/// Human-readable label for a byte count, in binary kilobytes.
///
/// ```
/// use devmem_common::units::size_label;
///
/// assert_eq!(size_label(192_000_000.0), "187500.0 kB");
/// ```
pub fn size_label(bytes: f64) -> String {
    format!("{:.1} kB", bytes / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_is_four_bytes() {
        assert_eq!(ELEMENT_BYTES, 4);
    }

    #[test]
    fn size_label_small_values() {
        assert_eq!(size_label(0.0), "0.0 kB");
        assert_eq!(size_label(16_000.0), "15.6 kB");
    }
}
