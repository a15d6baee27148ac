//! # blkbench: block I/O benchmark
//!
//! Issues a fixed volume of reads or writes ([`ACCESS_SIZE`], 64 MiB by
//! default) inside the first [`PART_SIZE`] bytes (1 GiB) of a file or block
//! device, one block at a time, and reports how long it took.
//!
//! The parameter space is:
//!
//! - **operation**: read or write
//! - **pattern**: sequential, or a uniformly random permutation of the
//!   region's blocks
//! - **block size**: any size that tiles both the access volume and the
//!   region
//! - **kernel assist**: through the page cache, or direct I/O (`O_DIRECT`)
//!   with a sector-aligned buffer
//!
//! ## Example
//!
//! ```no_run
//! use blkbench::{AccessPlan, BenchmarkConfig, Driver, IoAssist, Operation, Pattern};
//! use blkbench_io::SyncBackend;
//!
//! let config = BenchmarkConfig::builder("/dev/sdb")
//!     .io_assist(IoAssist::Off)
//!     .operation(Operation::Read)
//!     .pattern(Pattern::Random)
//!     .block_size_kb(4)
//!     .build()?;
//! let plan = AccessPlan::for_config(&config, None);
//!
//! let metrics = Driver::new(SyncBackend::new(), config).run(&plan)?;
//! println!("{:.1} MiB/s", metrics.throughput_mib_per_sec());
//! # Ok::<(), blkbench::BenchError>(())
//! ```

mod config;
mod driver;
mod error;
mod metrics;
mod plan;

pub use config::{
    ACCESS_SIZE, BenchmarkConfig, BenchmarkConfigBuilder, Geometry, IoAssist, KIB, Operation,
    PART_SIZE, Pattern,
};
pub use driver::{Driver, DriverState};
pub use error::{ArgumentError, BenchError, FailureKind};
pub use metrics::{LatencySummary, LatencyTracker, Metrics, Report};
pub use plan::AccessPlan;

use blkbench_io::SyncBackend;

/// Builds the plan for `config` and runs it against the real device.
pub fn run_benchmark(config: BenchmarkConfig, seed: Option<u64>) -> Result<Metrics, BenchError> {
    let plan = AccessPlan::for_config(&config, seed);
    Driver::new(SyncBackend::new(), config).run(&plan)
}
