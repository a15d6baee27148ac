//! Benchmark error types.
//!
//! [`ArgumentError`] covers everything detected before the target is
//! touched. [`BenchError`] wraps it together with one variant per failing
//! step of a run. The message names the step; the OS reason is the error's
//! `source()`, so a report walking the chain prints it once.

use std::path::PathBuf;

use blkbench_io::IoError;

use crate::config::{Operation, Pattern};

/// Malformed or out-of-range benchmark parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("block size should be > 0")]
    ZeroBlockSize,

    #[error("block size of {kb} KiB does not fit in 64 bits")]
    BlockSizeOverflow { kb: u64 },

    #[error("access size({access_size}) should be multiple of block size: {block_size}")]
    AccessNotMultiple { access_size: u64, block_size: u64 },

    #[error("region size({region_size}) should be multiple of block size: {block_size}")]
    RegionNotMultiple { region_size: u64, block_size: u64 },

    #[error(
        "access size({access_size}) should be > 0 and no larger than region size({region_size})"
    )]
    InvalidGeometry { region_size: u64, access_size: u64 },

    #[error(
        "block size({block_size}) should be multiple of sector size({sector_size}) for direct I/O"
    )]
    BlockNotSectorMultiple { block_size: u64, sector_size: usize },

    #[error("access plan covers {plan_blocks} blocks but the region has {region_blocks}")]
    PlanSizeMismatch { plan_blocks: u64, region_blocks: u64 },

    #[error("access plan is {plan} but the benchmark is configured for {configured}")]
    PlanPatternMismatch { plan: Pattern, configured: Pattern },

    #[error("{what} should be {expected}: {value}")]
    InvalidToken {
        what: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Which step a failed run stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Argument,
    Allocation,
    DeviceOpen,
    DeviceQuery,
    Seek,
    Transfer,
    IncompleteTransfer,
    Sync,
    Close,
    AlreadyRun,
}

/// Errors from a benchmark run.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("posix_memalign() failed")]
    Allocation { source: IoError },

    #[error("open() failed for {path}")]
    DeviceOpen { path: PathBuf, source: IoError },

    #[error("ioctl() failed for {path}")]
    DeviceQuery { path: PathBuf, source: IoError },

    #[error("lseek() failed at offset {offset}")]
    Seek { offset: u64, source: IoError },

    #[error("{operation}() failed at offset {offset}")]
    Transfer {
        operation: Operation,
        offset: u64,
        source: IoError,
    },

    #[error("{operation}() transferred {actual} of {expected} bytes at offset {offset}")]
    IncompleteTransfer {
        operation: Operation,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("fdatasync() failed at offset {offset}")]
    Sync { offset: u64, source: IoError },

    #[error("close() failed")]
    Close { source: IoError },

    #[error("benchmark driver has already run")]
    AlreadyRun,
}

impl BenchError {
    /// Returns the step this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Argument(_) => FailureKind::Argument,
            Self::Allocation { .. } => FailureKind::Allocation,
            Self::DeviceOpen { .. } => FailureKind::DeviceOpen,
            Self::DeviceQuery { .. } => FailureKind::DeviceQuery,
            Self::Seek { .. } => FailureKind::Seek,
            Self::Transfer { .. } => FailureKind::Transfer,
            Self::IncompleteTransfer { .. } => FailureKind::IncompleteTransfer,
            Self::Sync { .. } => FailureKind::Sync,
            Self::Close { .. } => FailureKind::Close,
            Self::AlreadyRun => FailureKind::AlreadyRun,
        }
    }

    /// True when written data may not have reached stable storage.
    pub fn is_durability_failure(&self) -> bool {
        matches!(self, Self::Sync { .. } | Self::Close { .. })
    }
}
