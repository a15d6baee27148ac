//! Measurements of one benchmark pass.

// Throughput and percentile reporting use f64 arithmetic on counts.
#![allow(clippy::cast_precision_loss)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

use crate::config::{Operation, Pattern};

const MIB: f64 = 1024.0 * 1024.0;

/// Tracks per-operation latency percentiles.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    histogram: Histogram<u64>,
}

impl LatencyTracker {
    /// Creates a new latency tracker.
    ///
    /// Auto-resizing histogram with 3 significant digits.
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(3).expect("valid histogram config"),
        }
    }

    /// Records one operation's latency.
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        // `record` grows the histogram; only values past its largest
        // representable bucket are clamped, so the sample count stays exact.
        if self.histogram.record(nanos).is_err() {
            self.histogram.saturating_record(nanos);
        }
    }

    /// Returns the total number of recorded samples.
    pub fn count(&self) -> u64 {
        self.histogram.len()
    }

    pub fn min(&self) -> u64 {
        self.histogram.min()
    }

    pub fn p50(&self) -> u64 {
        self.histogram.value_at_quantile(0.50)
    }

    pub fn p95(&self) -> u64 {
        self.histogram.value_at_quantile(0.95)
    }

    pub fn p99(&self) -> u64 {
        self.histogram.value_at_quantile(0.99)
    }

    pub fn p999(&self) -> u64 {
        self.histogram.value_at_quantile(0.999)
    }

    pub fn max(&self) -> u64 {
        self.histogram.max()
    }

    pub fn mean(&self) -> f64 {
        self.histogram.mean()
    }

    /// Exports the latency distribution as eCDF CSV.
    ///
    /// Format: `latency_ns,percentile`
    pub fn export_ecdf_csv<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "latency_ns,percentile")?;
        for v in self.histogram.iter_quantiles(1) {
            writeln!(
                writer,
                "{},{}",
                v.value_iterated_to(),
                v.percentile() / 100.0
            )?;
        }
        Ok(())
    }

    /// Snapshot of the percentiles for reporting.
    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            count: self.count(),
            min_ns: self.min(),
            p50_ns: self.p50(),
            p95_ns: self.p95(),
            p99_ns: self.p99(),
            p999_ns: self.p999(),
            max_ns: self.max(),
            mean_ns: self.mean(),
        }
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency percentiles in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min_ns: u64,
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub p999_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub target: PathBuf,
    pub operation: Operation,
    pub pattern: Pattern,
    /// True when the page cache was bypassed.
    pub direct: bool,
    pub block_size: u64,
    pub sector_size: usize,
    pub operations: u64,
    pub bytes_transferred: u64,
    /// Wall-clock time from the first seek until the target was closed.
    pub elapsed: Duration,
    pub latency: LatencyTracker,
}

impl Metrics {
    /// Throughput in MiB per second; zero for an instantaneous run.
    pub fn throughput_mib_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes_transferred as f64 / MIB / secs
    }

    /// Operations per second; zero for an instantaneous run.
    pub fn iops(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.operations as f64 / secs
    }

    /// Serializable view of the run.
    pub fn report(&self) -> Report {
        Report {
            target: self.target.display().to_string(),
            operation: self.operation,
            pattern: self.pattern,
            direct: self.direct,
            block_size: self.block_size,
            sector_size: self.sector_size,
            operations: self.operations,
            bytes_transferred: self.bytes_transferred,
            elapsed_secs: self.elapsed.as_secs_f64(),
            throughput_mib_per_sec: self.throughput_mib_per_sec(),
            iops: self.iops(),
            latency: self.latency.summary(),
        }
    }

    /// Exports the run as JSON for scripting and CI.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.report()).unwrap_or_default()
    }
}

/// Flat, serializable form of [`Metrics`].
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub target: String,
    pub operation: Operation,
    pub pattern: Pattern,
    pub direct: bool,
    pub block_size: u64,
    pub sector_size: usize,
    pub operations: u64,
    pub bytes_transferred: u64,
    pub elapsed_secs: f64,
    pub throughput_mib_per_sec: f64,
    pub iops: f64,
    pub latency: LatencySummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(elapsed: Duration) -> Metrics {
        let mut latency = LatencyTracker::new();
        for micros in [100, 200, 300, 400] {
            latency.record(Duration::from_micros(micros));
        }
        Metrics {
            target: PathBuf::from("/dev/sdz"),
            operation: Operation::Write,
            pattern: Pattern::Sequential,
            direct: true,
            block_size: 1024 * 1024,
            sector_size: 512,
            operations: 4,
            bytes_transferred: 4 * 1024 * 1024,
            elapsed,
            latency,
        }
    }

    #[test]
    fn latency_percentiles_are_ordered() {
        let mut tracker = LatencyTracker::new();
        for i in 1..=100 {
            tracker.record(Duration::from_micros(i));
        }
        assert_eq!(tracker.count(), 100);
        assert!(tracker.p50() > 0);
        assert!(tracker.p99() > tracker.p50());
        assert!(tracker.max() >= tracker.p999());
        assert!(tracker.min() <= tracker.p50());
    }

    #[test]
    fn recorded_latencies_keep_their_magnitude() {
        let mut tracker = LatencyTracker::new();
        tracker.record(Duration::from_micros(250));
        tracker.record(Duration::from_millis(2));

        assert_eq!(tracker.count(), 2);
        // 3 significant digits: within 0.1% of the recorded value
        assert!(tracker.min().abs_diff(250_000) <= 250);
        assert!(tracker.max().abs_diff(2_000_000) <= 2_000);
        assert!(tracker.mean() > 1_000_000.0);
    }

    #[test]
    fn huge_latency_is_counted() {
        let mut tracker = LatencyTracker::new();
        tracker.record(Duration::MAX);
        tracker.record(Duration::from_micros(1));
        assert_eq!(tracker.count(), 2);
    }

    #[test]
    fn throughput_and_iops() {
        let m = metrics(Duration::from_secs(2));
        assert!((m.throughput_mib_per_sec() - 2.0).abs() < 1e-9);
        assert!((m.iops() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_elapsed_reports_zero_rates() {
        let m = metrics(Duration::ZERO);
        assert_eq!(m.throughput_mib_per_sec(), 0.0);
        assert_eq!(m.iops(), 0.0);
    }

    #[test]
    fn json_report_fields() {
        let json = metrics(Duration::from_secs(1)).to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["operation"], "write");
        assert_eq!(parsed["pattern"], "sequential");
        assert_eq!(parsed["direct"], true);
        assert_eq!(parsed["operations"], 4);
        assert_eq!(parsed["bytes_transferred"], 4 * 1024 * 1024);
        assert_eq!(parsed["latency"]["count"], 4);
        let max_ns = parsed["latency"]["max_ns"].as_u64().unwrap();
        assert!(max_ns.abs_diff(400_000) <= 400);
        let min_ns = parsed["latency"]["min_ns"].as_u64().unwrap();
        assert!(min_ns.abs_diff(100_000) <= 100);
    }

    #[test]
    fn ecdf_csv_export() {
        let mut tracker = LatencyTracker::new();
        for i in 1..=1000 {
            tracker.record(Duration::from_nanos(i * 1000));
        }

        let mut buf = Vec::new();
        tracker.export_ecdf_csv(&mut buf).unwrap();

        let csv = String::from_utf8(buf).unwrap();
        assert!(csv.starts_with("latency_ns,percentile\n"));
        assert!(csv.lines().count() > 2);

        let last_ns: u64 = csv
            .lines()
            .last()
            .and_then(|line| line.split(',').next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(last_ns >= 999_000);
    }
}
