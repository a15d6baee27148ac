//! Human-readable report.

use blkbench::Metrics;

use super::colors::SemanticStyle;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Prints the text report for a finished run to stdout.
pub fn print_report(metrics: &Metrics) {
    let latency = metrics.latency.summary();
    let assist = if metrics.direct { "direct I/O" } else { "page cache" };

    println!(
        "{} {} {} complete",
        "✓".success(),
        metrics.pattern,
        metrics.operation
    );
    print_labeled("target", &metrics.target.display().code());
    print_labeled("assist", assist);
    print_labeled(
        "block size",
        &format!(
            "{} (sector {} B)",
            format_bytes(metrics.block_size),
            metrics.sector_size
        ),
    );
    print_labeled(
        "transferred",
        &format!(
            "{} in {} operations",
            format_bytes(metrics.bytes_transferred),
            metrics.operations
        ),
    );
    print_labeled(
        "elapsed",
        &format!("{:.3} s", metrics.elapsed.as_secs_f64()),
    );
    print_labeled(
        "throughput",
        &format!("{:.2} MiB/s", metrics.throughput_mib_per_sec()).metric(),
    );
    print_labeled("iops", &format!("{:.0}", metrics.iops()).metric());
    print_labeled(
        "latency",
        &format!(
            "p50 {}  p99 {}  max {}",
            format_ns(latency.p50_ns),
            format_ns(latency.p99_ns),
            format_ns(latency.max_ns)
        ),
    );
}

fn print_labeled(key: &str, value: &str) {
    println!("  {}: {}", key.muted(), value);
}

fn format_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.0} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn format_ns(ns: u64) -> String {
    match ns {
        0..1_000 => format!("{ns} ns"),
        1_000..1_000_000 => format!("{:.1} µs", ns as f64 / 1e3),
        1_000_000..1_000_000_000 => format!("{:.2} ms", ns as f64 / 1e6),
        _ => format!("{:.2} s", ns as f64 / 1e9),
    }
}
