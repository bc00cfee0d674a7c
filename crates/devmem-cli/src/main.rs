//! devmem: device memory bandwidth benchmark.

use anyhow::{Context, Result};
use clap::Parser;
use devmem_cli::exit::{exit_code_for, EXIT_GENERIC_FAIL};
use devmem_cli::{BenchmarkOutput, Cli, OutputConfig};
use devmem_engine::{DeviceMemoryBenchmark, HostOffload, ResultDatabase, TimerService};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();
    let output = cli.output_config();

    if let Err(e) = setup_logging(cli.log_level.as_deref(), &output) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(EXIT_GENERIC_FAIL);
    }

    if let Err(e) = run(&cli, &output) {
        error!("benchmark failed: {}", e);
        for cause in e.chain().skip(1) {
            error!("  caused by: {}", cause);
        }

        std::process::exit(exit_code_for(&e));
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins; otherwise `--quiet`/`--verbose`, then `--log-level`,
/// then `info`.
fn setup_logging(log_level: Option<&str>, output: &OutputConfig) -> Result<()> {
    let level = output.log_level_override().or(log_level).unwrap_or("info");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

fn run(cli: &Cli, output: &OutputConfig) -> Result<()> {
    let constants = cli.resolve_constants().context("failed to resolve benchmark constants")?;

    if cli.print_config {
        let toml = constants.to_toml()?;
        return output.write(&toml, cli.output.as_deref());
    }

    let options = cli.option_database()?;
    let device = HostOffload::builder().memory_limit_bytes(constants.memory_limit_bytes).build();
    let mut bench = DeviceMemoryBenchmark::new(constants.clone(), device, TimerService::new())?;

    let mut results = ResultDatabase::new();
    let report = bench.run(&options, &mut results)?;
    info!(
        passes = report.passes_completed,
        records = report.records_emitted,
        size = %report.size_label,
        "benchmark complete"
    );

    let (_, timer) = bench.into_parts();
    let rendered = output.render(&BenchmarkOutput {
        constants: &constants,
        report: &report,
        summaries: results.summaries(),
        results: &results,
        timings: timer.timings(),
    })?;
    output.write(&rendered, cli.output.as_deref())
}
