//! Result sink contract and the in-memory result database.

use serde::Serialize;

use crate::compat::is_sentinel;

/// One `(metric, size label, unit, value)` measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub metric: String,
    pub size_label: String,
    pub unit: String,
    pub value: f64,
}

impl MeasurementRecord {
    pub fn new(metric: &str, size_label: &str, unit: &str, value: f64) -> Self {
        Self {
            metric: metric.to_string(),
            size_label: size_label.to_string(),
            unit: unit.to_string(),
            value,
        }
    }
}

/// Append-only destination for measurement records.
pub trait ResultSink {
    fn add_result(&mut self, record: MeasurementRecord);
}

/// Descriptive statistics over the real (non-sentinel) values of a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// `None` when `values` is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self { median, mean, stddev: variance.sqrt(), min: sorted[0], max: sorted[n - 1] })
    }
}

/// All records sharing one `(metric, size label, unit)` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub metric: String,
    pub size_label: String,
    pub unit: String,
    /// Number of records in the group, sentinels included.
    pub count: usize,
    /// `None` when every value in the group is a sentinel.
    pub stats: Option<SummaryStats>,
}

const SUMMARY_COLUMNS: [&str; 8] = ["test", "atts", "units", "median", "mean", "stddev", "min", "max"];

/// In-memory [`ResultSink`] with summary reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultDatabase {
    records: Vec<MeasurementRecord>,
}

impl ResultDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values recorded under `metric`, in insertion order.
    pub fn values_for<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.records.iter().filter(move |r| r.metric == metric).map(|r| r.value)
    }

    /// Group records by `(metric, size label, unit)` in first-seen order.
    pub fn summaries(&self) -> Vec<ResultSummary> {
        let mut groups: Vec<(&MeasurementRecord, Vec<f64>, usize)> = Vec::new();
        for record in &self.records {
            let idx = match groups.iter().position(|(key, _, _)| {
                key.metric == record.metric
                    && key.size_label == record.size_label
                    && key.unit == record.unit
            }) {
                Some(idx) => idx,
                None => {
                    groups.push((record, Vec::new(), 0));
                    groups.len() - 1
                }
            };
            let (_, values, count) = &mut groups[idx];
            *count += 1;
            if !is_sentinel(record.value) {
                values.push(record.value);
            }
        }

        groups
            .into_iter()
            .map(|(key, values, count)| ResultSummary {
                metric: key.metric.clone(),
                size_label: key.size_label.clone(),
                unit: key.unit.clone(),
                count,
                stats: SummaryStats::from_values(&values),
            })
            .collect()
    }

    /// Aligned text table, one row per summary group.
    pub fn render_summary_table(&self) -> String {
        let mut out = String::new();
        let header = SUMMARY_COLUMNS.map(String::from);
        push_table_row(&mut out, &header);
        for summary in self.summaries() {
            push_table_row(&mut out, &summary_cells(&summary));
        }
        out
    }

    /// CSV with the same columns as the text table.
    pub fn to_csv(&self) -> String {
        let mut out = SUMMARY_COLUMNS.join(",");
        out.push('\n');
        for summary in self.summaries() {
            out.push_str(&summary_cells(&summary).join(","));
            out.push('\n');
        }
        out
    }
}

impl ResultSink for ResultDatabase {
    fn add_result(&mut self, record: MeasurementRecord) {
        self.records.push(record);
    }
}

fn summary_cells(summary: &ResultSummary) -> [String; 8] {
    let stat = |pick: fn(&SummaryStats) -> f64| {
        summary.stats.as_ref().map_or_else(|| "N/A".to_string(), |s| format!("{:.4}", pick(s)))
    };
    [
        summary.metric.clone(),
        summary.size_label.clone(),
        summary.unit.clone(),
        stat(|s| s.median),
        stat(|s| s.mean),
        stat(|s| s.stddev),
        stat(|s| s.min),
        stat(|s| s.max),
    ]
}

fn push_table_row(out: &mut String, cells: &[String; 8]) {
    let line = format!(
        "{:<28} {:<16} {:<6} {:>12} {:>12} {:>12} {:>12} {:>12}",
        cells[0], cells[1], cells[2], cells[3], cells[4], cells[5], cells[6], cells[7]
    );
    out.push_str(line.trim_end());
    out.push('\n');
}
