//! The benchmark driver: one synchronous pass over an access plan.
//!
//! ```text
//! Created → Opened → DeviceQueried → BufferReady → Transferring → Closed → Done
//!     └──────────┴───────────┴────────────┴─────────────┴──────────┴──→ Failed(kind)
//! ```
//!
//! Every transfer is seek → read/write → `fdatasync`, and the sync is what
//! makes cached writes comparable to direct ones: without it `write(2)`
//! only queues the data. The first failure aborts the run; nothing is
//! retried, since a retry would distort the timing being measured.

use std::path::Path;
use std::time::Instant;

use blkbench_io::{AlignedBuffer, FileHandle, IoBackend, IoError};

use crate::config::{BenchmarkConfig, Operation};
use crate::error::{ArgumentError, BenchError, FailureKind};
use crate::metrics::{LatencyTracker, Metrics};
use crate::plan::AccessPlan;

/// Lifecycle of a [`Driver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Created,
    Opened,
    DeviceQueried,
    BufferReady,
    Transferring { completed: u64 },
    Closed,
    Done,
    Failed(FailureKind),
}

/// Runs one benchmark pass against a target through an [`IoBackend`].
///
/// A driver runs at most once. It owns the backend, and during `run` it
/// exclusively owns the device handle and the transfer buffer.
#[derive(Debug)]
pub struct Driver<B> {
    backend: B,
    config: BenchmarkConfig,
    state: DriverState,
}

impl<B: IoBackend> Driver<B> {
    pub fn new(backend: B, config: BenchmarkConfig) -> Self {
        Self {
            backend,
            config,
            state: DriverState::Created,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Executes the first `transfer_count` entries of `plan`.
    ///
    /// On failure the driver moves to [`DriverState::Failed`]; the handle and
    /// buffer are released on every path.
    pub fn run(&mut self, plan: &AccessPlan) -> Result<Metrics, BenchError> {
        if self.state != DriverState::Created {
            return Err(BenchError::AlreadyRun);
        }

        let result = self.execute(plan);
        if let Err(e) = &result {
            self.state = DriverState::Failed(e.kind());
            tracing::error!(
                target_path = %self.config.target().display(),
                error = %e,
                cause = std::error::Error::source(e).map(tracing::field::display),
                "benchmark aborted"
            );
        }
        result
    }

    fn execute(&mut self, plan: &AccessPlan) -> Result<Metrics, BenchError> {
        self.check_plan(plan)?;

        let target = self.config.target().to_path_buf();
        let flags = self.config.open_flags();
        let mut handle =
            self.backend
                .open(&target, flags)
                .map_err(|source| BenchError::DeviceOpen {
                    path: target.clone(),
                    source,
                })?;
        self.state = DriverState::Opened;

        let (sector_size, latency, started) = match self.measure(&mut handle, &target, plan) {
            Ok(measured) => measured,
            Err(e) => {
                if let Err(close_err) = self.backend.close(handle) {
                    tracing::warn!(
                        target_path = %target.display(),
                        error = %close_err,
                        "close after failed run also failed"
                    );
                }
                return Err(e);
            }
        };

        self.backend
            .close(handle)
            .map_err(|source| BenchError::Close { source })?;
        let elapsed = started.elapsed();
        self.state = DriverState::Closed;

        let block_size = self.config.block_size();
        let metrics = Metrics {
            target,
            operation: self.config.operation(),
            pattern: self.config.pattern(),
            direct: flags.direct,
            block_size,
            sector_size,
            operations: latency.count(),
            bytes_transferred: latency.count() * block_size,
            elapsed,
            latency,
        };
        self.state = DriverState::Done;

        tracing::info!(
            operations = metrics.operations,
            bytes = metrics.bytes_transferred,
            elapsed_ms = metrics.elapsed.as_millis() as u64,
            "benchmark complete"
        );
        Ok(metrics)
    }

    /// A plan must index exactly the configured region in the configured
    /// order, otherwise offsets could fall outside the region.
    fn check_plan(&self, plan: &AccessPlan) -> Result<(), ArgumentError> {
        let plan_blocks = plan.len() as u64;
        let region_blocks = self.config.region_block_count();
        if plan_blocks != region_blocks {
            return Err(ArgumentError::PlanSizeMismatch {
                plan_blocks,
                region_blocks,
            });
        }
        if plan.pattern() != self.config.pattern() {
            return Err(ArgumentError::PlanPatternMismatch {
                plan: plan.pattern(),
                configured: self.config.pattern(),
            });
        }
        Ok(())
    }

    /// Everything between open and close: sector query, buffer, transfers.
    fn measure(
        &mut self,
        handle: &mut FileHandle,
        target: &Path,
        plan: &AccessPlan,
    ) -> Result<(usize, LatencyTracker, Instant), BenchError> {
        let sector_size = self
            .backend
            .sector_size(handle)
            .and_then(|size| {
                if size == 0 {
                    return Err(IoError::UnsupportedTarget {
                        path: target.to_path_buf(),
                    });
                }
                Ok(size)
            })
            .map_err(|source| BenchError::DeviceQuery {
                path: target.to_path_buf(),
                source,
            })?;
        self.state = DriverState::DeviceQueried;

        let block_size = self.config.block_size();
        let direct = self.config.open_flags().direct;
        if direct && block_size % sector_size as u64 != 0 {
            return Err(ArgumentError::BlockNotSectorMultiple {
                block_size,
                sector_size,
            }
            .into());
        }

        let mut buffer = acquire_buffer(block_size, sector_size)?;
        self.state = DriverState::BufferReady;

        tracing::info!(
            target_path = %target.display(),
            operation = %self.config.operation(),
            pattern = %plan.pattern(),
            direct,
            block_size,
            sector_size,
            transfers = self.config.transfer_count(),
            "starting benchmark"
        );

        let started = Instant::now();
        let latency = self.transfer_all(handle, plan, &mut buffer)?;
        Ok((sector_size, latency, started))
    }

    fn transfer_all(
        &mut self,
        handle: &mut FileHandle,
        plan: &AccessPlan,
        buffer: &mut AlignedBuffer,
    ) -> Result<LatencyTracker, BenchError> {
        let operation = self.config.operation();
        let block_size = self.config.block_size();
        let count = self.config.transfer_count() as usize;
        let mut latency = LatencyTracker::new();

        self.state = DriverState::Transferring { completed: 0 };
        for offset in plan.offsets(block_size, count) {
            let op_started = Instant::now();

            self.backend
                .seek(handle, offset)
                .map_err(|source| BenchError::Seek { offset, source })?;

            let transferred = match operation {
                Operation::Read => self.backend.read(handle, buffer.as_mut_slice()),
                Operation::Write => self.backend.write(handle, buffer.as_slice()),
            }
            .map_err(|source| BenchError::Transfer {
                operation,
                offset,
                source,
            })?;
            if transferred != buffer.len() {
                return Err(BenchError::IncompleteTransfer {
                    operation,
                    offset,
                    expected: buffer.len(),
                    actual: transferred,
                });
            }

            self.backend
                .sync_data(handle)
                .map_err(|source| BenchError::Sync { offset, source })?;

            latency.record(op_started.elapsed());
            self.state = DriverState::Transferring {
                completed: latency.count(),
            };
            tracing::trace!(offset, "transfer complete");
        }

        Ok(latency)
    }
}

/// Allocates the transfer buffer: `block_size` bytes aligned to the sector size.
fn acquire_buffer(block_size: u64, sector_size: usize) -> Result<AlignedBuffer, BenchError> {
    let size = usize::try_from(block_size).map_err(|_| BenchError::Allocation {
        source: IoError::Allocation {
            size: usize::MAX,
            alignment: sector_size,
        },
    })?;
    let buffer =
        AlignedBuffer::new(size, sector_size).map_err(|source| BenchError::Allocation { source })?;
    debug_assert!(buffer.is_aligned_to(sector_size));
    Ok(buffer)
}
