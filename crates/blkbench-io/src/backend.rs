//! I/O backend trait.
//!
//! The [`IoBackend`] trait abstracts the device operations the benchmark
//! driver issues, in the order it issues them:
//! open → sector-size query → (seek → read/write → data sync)* → close.
//!
//! The real implementation is [`SyncBackend`](crate::SyncBackend); tests use
//! in-memory backends to observe exactly which transfers were issued.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::IoError;

/// Flags for opening a benchmark target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Open for reading.
    pub read: bool,
    /// Open for writing.
    pub write: bool,
    /// Exclusive open (`O_EXCL`). For block devices this fails with `EBUSY`
    /// if the device is mounted or held by another exclusive opener.
    pub exclusive: bool,
    /// Use Direct I/O (`O_DIRECT` on Linux, ignored elsewhere).
    pub direct: bool,
}

impl OpenFlags {
    /// Read-write exclusive access through the page cache.
    pub fn buffered() -> Self {
        Self {
            read: true,
            write: true,
            exclusive: true,
            direct: false,
        }
    }

    /// Read-write exclusive access bypassing the page cache.
    pub fn direct() -> Self {
        Self {
            direct: true,
            ..Self::buffered()
        }
    }
}

/// Opaque handle to an open target.
///
/// For `SyncBackend` it wraps a `std::fs::File`. Backends that have no OS
/// file (test doubles) create handles with [`FileHandle::detached`]. The
/// handle must be closed via [`IoBackend::close`]; dropping it closes the
/// descriptor without reporting errors.
#[derive(Debug)]
pub struct FileHandle {
    /// Backend-assigned identifier.
    pub(crate) id: u64,
    /// Path the handle was opened from.
    pub(crate) path: PathBuf,
    /// Whether the handle bypasses the page cache.
    pub(crate) direct: bool,
    /// The open file (for sync backend).
    pub(crate) file: Option<File>,
}

impl FileHandle {
    /// Creates a new file handle wrapping a `std::fs::File`.
    pub(crate) fn from_file(id: u64, path: &Path, direct: bool, file: File) -> Self {
        Self {
            id,
            path: path.to_path_buf(),
            direct,
            file: Some(file),
        }
    }

    /// Creates a handle with no OS file behind it.
    pub fn detached(id: u64, path: &Path, direct: bool) -> Self {
        Self {
            id,
            path: path.to_path_buf(),
            direct,
            file: None,
        }
    }

    /// Returns the backend-assigned identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the path the handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if transfers through this handle bypass the page cache.
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Returns the internal file reference.
    pub(crate) fn file(&self) -> Result<&File, IoError> {
        self.file
            .as_ref()
            .ok_or(IoError::InvalidHandle { handle: self.id })
    }

    /// Returns the internal file reference mutably.
    pub(crate) fn file_mut(&mut self) -> Result<&mut File, IoError> {
        self.file
            .as_mut()
            .ok_or(IoError::InvalidHandle { handle: self.id })
    }
}

/// Abstraction over the device operations of one benchmark pass.
///
/// All methods are synchronous and block until the OS call returns. Each
/// transfer method issues exactly one system call, so a short count is
/// reported to the caller instead of being retried.
pub trait IoBackend {
    /// Opens the target with the given flags.
    fn open(&self, path: &Path, flags: OpenFlags) -> Result<FileHandle, IoError>;

    /// Returns the logical sector size of the target in bytes.
    fn sector_size(&self, handle: &FileHandle) -> Result<usize, IoError>;

    /// Moves the file position to the absolute byte `offset`.
    fn seek(&self, handle: &mut FileHandle, offset: u64) -> Result<u64, IoError>;

    /// Reads into `buf` at the current position.
    ///
    /// Returns the number of bytes read.
    fn read(&self, handle: &mut FileHandle, buf: &mut [u8]) -> Result<usize, IoError>;

    /// Writes `buf` at the current position.
    ///
    /// Returns the number of bytes written.
    fn write(&self, handle: &mut FileHandle, buf: &[u8]) -> Result<usize, IoError>;

    /// Waits until previously written data is on stable storage (`fdatasync`).
    fn sync_data(&self, handle: &FileHandle) -> Result<(), IoError>;

    /// Closes the handle, reporting errors the OS defers to close time.
    fn close(&self, handle: FileHandle) -> Result<(), IoError>;
}
