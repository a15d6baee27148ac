//! I/O error types.

use std::path::PathBuf;

/// Errors from the I/O backend.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Underlying OS I/O error.
    #[error(transparent)]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Invalid file handle.
    #[error("invalid file handle: {handle}")]
    InvalidHandle { handle: u64 },

    /// Aligned allocation could not be satisfied.
    #[error("cannot allocate {size} bytes aligned to {alignment}")]
    Allocation { size: usize, alignment: usize },

    /// The target has no sector size (neither a block device nor a regular file).
    #[error("{path} is neither a block device nor a regular file")]
    UnsupportedTarget { path: PathBuf },
}
