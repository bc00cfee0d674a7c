//! Placeholder results for metrics this benchmark does not measure.
//!
//! Downstream aggregators expect the full device-memory metric set. Every
//! metric listed here is reported once per pass with [`SENTINEL_VALUE`], which
//! must never be read as a measurement.

use devmem_common::BANDWIDTH_UNIT;

use crate::results::MeasurementRecord;

/// Metrics reported with the sentinel value, in emission order.
pub const UNMEASURED_METRICS: [&str; 5] = [
    "readGlobalMemoryUnit",
    "writeGlobalMemoryUnit",
    "readLocalMemory",
    "writeLocalMemory",
    "TextureRepeatedRandomAccess",
];

/// Largest finite `f32`, widened to `f64`.
pub const SENTINEL_VALUE: f64 = f32::MAX as f64;

/// Whether `value` is the unmeasured-metric sentinel.
pub fn is_sentinel(value: f64) -> bool {
    value == SENTINEL_VALUE
}

/// Sentinel records for one pass.
pub fn unmeasured_records(size_label: &str) -> impl Iterator<Item = MeasurementRecord> + '_ {
    UNMEASURED_METRICS
        .iter()
        .map(move |metric| MeasurementRecord::new(metric, size_label, BANDWIDTH_UNIT, SENTINEL_VALUE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_max_finite_float() {
        assert!(SENTINEL_VALUE.is_finite());
        assert!(is_sentinel(f64::from(f32::MAX)));
        assert!(!is_sentinel(1.0));
        assert!(!is_sentinel(f64::MAX));
    }

    #[test]
    fn one_record_per_unmeasured_metric() {
        let records: Vec<_> = unmeasured_records("15.6 kB").collect();
        assert_eq!(records.len(), UNMEASURED_METRICS.len());
        for (record, name) in records.iter().zip(UNMEASURED_METRICS) {
            assert_eq!(record.metric, name);
            assert_eq!(record.size_label, "15.6 kB");
            assert_eq!(record.unit, "GB/s");
            assert!(is_sentinel(record.value));
        }
    }
}
