//! Synchronous I/O backend using `std::fs`.
//!
//! Files opened with `OpenFlags::direct = true` use `O_DIRECT` on Linux to
//! bypass the page cache; `OpenFlags::exclusive` adds `O_EXCL`, which for
//! block devices claims the device exclusively.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::{FileHandle, IoBackend, OpenFlags};
use crate::{IoError, sys};

/// Synchronous I/O backend using `std::fs::File`.
///
/// All operations block, and each transfer is a single `read(2)` or
/// `write(2)` so that short counts reach the caller.
#[derive(Debug)]
pub struct SyncBackend {
    /// Counter for generating unique file handle IDs.
    next_handle_id: AtomicU64,
}

impl SyncBackend {
    /// Creates a new synchronous I/O backend.
    pub fn new() -> Self {
        Self {
            next_handle_id: AtomicU64::new(1),
        }
    }

    /// Returns the next unique handle ID.
    fn next_id(&self) -> u64 {
        self.next_handle_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SyncBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IoBackend for SyncBackend {
    fn open(&self, path: &Path, flags: OpenFlags) -> Result<FileHandle, IoError> {
        let mut opts = OpenOptions::new();
        opts.read(flags.read)
            .write(flags.write)
            .custom_flags(sys::custom_open_flags(flags.exclusive, flags.direct));

        let file = opts.open(path)?;
        let id = self.next_id();
        tracing::debug!(
            target_path = %path.display(),
            handle = id,
            direct = flags.direct,
            exclusive = flags.exclusive,
            "opened target"
        );
        Ok(FileHandle::from_file(id, path, flags.direct, file))
    }

    fn sector_size(&self, handle: &FileHandle) -> Result<usize, IoError> {
        let file = handle.file()?;
        let metadata = file.metadata()?;
        let file_type = metadata.file_type();

        if file_type.is_block_device() {
            return Ok(sys::logical_sector_size(file)?);
        }
        if file_type.is_file() {
            // Regular files have no sector size; the filesystem's preferred
            // I/O size satisfies its direct I/O alignment rules.
            return Ok(file_alignment(metadata.blksize()));
        }

        Err(IoError::UnsupportedTarget {
            path: handle.path.clone(),
        })
    }

    fn seek(&self, handle: &mut FileHandle, offset: u64) -> Result<u64, IoError> {
        let pos = handle.file_mut()?.seek(SeekFrom::Start(offset))?;
        Ok(pos)
    }

    fn read(&self, handle: &mut FileHandle, buf: &mut [u8]) -> Result<usize, IoError> {
        let n = handle.file_mut()?.read(buf)?;
        Ok(n)
    }

    fn write(&self, handle: &mut FileHandle, buf: &[u8]) -> Result<usize, IoError> {
        let n = handle.file_mut()?.write(buf)?;
        Ok(n)
    }

    fn sync_data(&self, handle: &FileHandle) -> Result<(), IoError> {
        handle.file()?.sync_data()?;
        Ok(())
    }

    fn close(&self, mut handle: FileHandle) -> Result<(), IoError> {
        let file = handle
            .file
            .take()
            .ok_or(IoError::InvalidHandle { handle: handle.id })?;
        sys::close_checked(file)?;
        tracing::debug!(handle = handle.id, "closed target");
        Ok(())
    }
}

/// Smallest logical sector size any Linux block device reports.
const MIN_SECTOR_SIZE: usize = 512;

/// Alignment to use for a regular file whose `st_blksize` is `blksize`.
///
/// Buffers need a power-of-two alignment; values that are not one (or do
/// not fit in `usize`) fall back to the smallest sector size.
fn file_alignment(blksize: u64) -> usize {
    match usize::try_from(blksize) {
        Ok(size) if size.is_power_of_two() => size,
        _ => MIN_SECTOR_SIZE,
    }
}
