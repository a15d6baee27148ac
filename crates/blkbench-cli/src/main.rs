//! blkbench command-line front end.
//!
//! Times a fixed volume of block-sized reads or writes against a file or
//! block device.
//!
//! # Quick Start
//!
//! ```bash
//! # Direct sequential writes of 64 KiB blocks (destroys data on the target)
//! blkbench /dev/sdb off w seq 64
//!
//! # Cached random reads of 4 KiB blocks, reported as JSON
//! blkbench /dev/sdb on r rand 4 --format json
//! ```

mod style;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blkbench::{BenchmarkConfig, Geometry, IoAssist, Metrics, Operation, Pattern};
use blkbench_config::{BenchSettings, OutputFormat};
use clap::{Parser, ValueEnum};

/// blkbench - raw block device I/O benchmark.
#[derive(Parser)]
#[command(name = "blkbench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Block device or pre-sized file to benchmark.
    target: PathBuf,

    /// Kernel's help: `on` goes through the page cache, `off` uses O_DIRECT.
    assist: IoAssist,

    /// Transfer direction: `r` or `w`.
    mode: Operation,

    /// Access pattern: `seq` or `rand`.
    pattern: Pattern,

    /// Block size in KiB.
    block_size_kb: u64,

    /// Report format (overrides settings).
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Seed for the random access plan (overrides settings).
    #[arg(long)]
    seed: Option<u64>,

    /// Write the latency eCDF to this file as CSV.
    #[arg(long, value_name = "PATH")]
    latency_csv: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = BenchSettings::load().context("Failed to load settings")?;
    tracing::debug!(?settings, "settings resolved");

    style::set_no_color(
        cli.no_color || !settings.output.color || std::env::var_os("NO_COLOR").is_some(),
    );

    let geometry = Geometry::new(
        settings.benchmark.region_size,
        settings.benchmark.access_size,
    )?;
    let config = BenchmarkConfig::builder(&cli.target)
        .io_assist(cli.assist)
        .operation(cli.mode)
        .pattern(cli.pattern)
        .block_size_kb(cli.block_size_kb)
        .geometry(geometry)
        .build()?;

    let seed = cli.seed.or(settings.benchmark.seed);
    let metrics = blkbench::run_benchmark(config, seed)
        .with_context(|| format!("Benchmark of {} failed", cli.target.display()))?;

    if let Some(path) = &cli.latency_csv {
        write_latency_csv(&metrics, path)?;
    }

    let format = cli.format.map_or(settings.output.format, OutputFormat::from);
    match format {
        OutputFormat::Text => style::print_report(&metrics),
        OutputFormat::Json => println!("{}", metrics.to_json()),
    }

    Ok(())
}

fn write_latency_csv(metrics: &Metrics, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    metrics
        .latency
        .export_ecdf_csv(&mut writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "latency eCDF written");
    Ok(())
}
