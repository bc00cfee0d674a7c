//! Output configuration and report rendering.
//!
//! Results go to stdout (or `--output`); everything else is logged to stderr
//! through `tracing`, so `--format json` and `--format csv` stay machine
//! readable.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use devmem_common::BenchmarkConstants;
use devmem_engine::{ResultDatabase, ResultSummary, RunReport, TimingRecord};
use serde::Serialize;

/// Output format for the result report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned summary table (default).
    #[default]
    Text,
    /// Full report as pretty-printed JSON.
    Json,
    /// Summary table as CSV.
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown format '{other}'. Expected one of: text, json, csv")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Output settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
}

/// Everything a finished run reports.
#[derive(Debug, Serialize)]
pub struct BenchmarkOutput<'a> {
    pub constants: &'a BenchmarkConstants,
    pub report: &'a RunReport,
    pub summaries: Vec<ResultSummary>,
    pub results: &'a ResultDatabase,
    #[serde(skip_serializing_if = "no_timings")]
    pub timings: &'a [TimingRecord],
}

fn no_timings(timings: &&[TimingRecord]) -> bool {
    timings.is_empty()
}

impl OutputConfig {
    /// Return the tracing log level implied by the flags.
    ///
    /// `--quiet` forces `error`, `--verbose` forces `debug`,
    /// otherwise returns `None` (use existing default).
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else if self.verbose {
            Some("debug")
        } else {
            None
        }
    }

    /// Render `output` in the configured format.
    pub fn render(&self, output: &BenchmarkOutput<'_>) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(output)?;
                json.push('\n');
                Ok(json)
            }
            OutputFormat::Csv => Ok(output.results.to_csv()),
            OutputFormat::Text => Ok(self.render_text(output)),
        }
    }

    fn render_text(&self, output: &BenchmarkOutput<'_>) -> String {
        let c = output.constants;
        let mut text = String::new();
        if !self.quiet {
            let _ = writeln!(
                text,
                "device memory bandwidth: {} passes, {} threads x {} elements, {} repetitions ({} per kernel)",
                output.report.passes_completed,
                c.thread_count,
                c.elements_per_thread,
                c.repetitions_per_pass,
                output.report.size_label,
            );
        }
        text.push_str(&output.results.render_summary_table());
        if self.verbose && !output.timings.is_empty() {
            text.push_str("\ntimings:\n");
            for t in output.timings {
                let _ = writeln!(text, "  {:<14} {:.6} s", t.label, t.seconds);
            }
        }
        text
    }

    /// Write rendered output to `path`, or stdout when `None`.
    pub fn write(&self, rendered: &str, path: Option<&Path>) -> anyhow::Result<()> {
        match path {
            Some(path) => std::fs::write(path, rendered)
                .with_context(|| format!("failed to write results to {}", path.display())),
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}
