//! # blkbench-io: I/O Backend Abstraction for blkbench
//!
//! This crate provides a trait-based abstraction over the handful of file
//! operations a block I/O benchmark needs, so the benchmark driver can run
//! against a real device or against an in-memory test double:
//!
//! - **`SyncBackend`** (default): blocking `std::fs` calls plus `libc` for
//!   `O_DIRECT`, `O_EXCL`, the `BLKSSZGET` sector-size query and a checked
//!   `close(2)`.
//! - **`AlignedBuffer`**: a transfer buffer whose base address is a multiple
//!   of the device sector size, as unbuffered transfers require.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │         blkbench         │
//! │ (Driver uses IoBackend)  │
//! └────────────┬─────────────┘
//!              │
//! ┌────────────┴─────────────┐
//! │       blkbench-io        │
//! │  ┌─────────┐ ┌─────────┐ │
//! │  │  Sync   │ │ Aligned │ │
//! │  │ Backend │ │ Buffer  │ │
//! │  └─────────┘ └─────────┘ │
//! └──────────────────────────┘
//! ```

mod aligned;
mod backend;
mod error;
mod sync_backend;
mod sys;

pub use aligned::AlignedBuffer;
pub use backend::{FileHandle, IoBackend, OpenFlags};
pub use error::IoError;
pub use sync_backend::SyncBackend;
