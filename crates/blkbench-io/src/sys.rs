//! Thin wrappers over the raw system calls `std` does not expose.

#![allow(unsafe_code)]

use std::fs::File;
use std::io;
use std::os::fd::IntoRawFd;

/// Queries the logical sector size of a block device (`BLKSSZGET`).
#[cfg(target_os = "linux")]
pub(crate) fn logical_sector_size(file: &File) -> io::Result<usize> {
    use std::os::fd::AsRawFd;

    let mut size: libc::c_int = 0;
    let size_ptr: *mut libc::c_int = &mut size;
    // SAFETY: the descriptor is valid for the lifetime of `file`, and
    // BLKSSZGET writes a single `int` through `size_ptr`.
    let ret = unsafe { libc::ioctl(file.as_raw_fd(), libc::BLKSSZGET, size_ptr) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    usize::try_from(size).map_err(|_| io::Error::other(format!("invalid sector size {size}")))
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn logical_sector_size(_file: &File) -> io::Result<usize> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Closes the descriptor and reports the result of `close(2)`.
///
/// Dropping a `File` discards close errors, but NFS and some block drivers
/// report deferred write failures only here.
pub(crate) fn close_checked(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    // SAFETY: `into_raw_fd` transferred ownership of `fd` to us and nothing
    // else closes it.
    let ret = unsafe { libc::close(fd) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Extra `open(2)` flags for exclusive and direct access.
pub(crate) fn custom_open_flags(exclusive: bool, direct: bool) -> libc::c_int {
    let mut flags = 0;
    if exclusive {
        flags |= libc::O_EXCL;
    }
    #[cfg(target_os = "linux")]
    if direct {
        flags |= libc::O_DIRECT;
    }
    #[cfg(not(target_os = "linux"))]
    let _ = direct;
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_flags_for_each_mode() {
        assert_eq!(custom_open_flags(false, false), 0);
        assert_ne!(custom_open_flags(true, false) & libc::O_EXCL, 0);
        #[cfg(target_os = "linux")]
        {
            let direct = custom_open_flags(true, true);
            assert_ne!(direct & libc::O_DIRECT, 0);
            assert_ne!(direct & libc::O_EXCL, 0);
            assert_eq!(custom_open_flags(true, false) & libc::O_DIRECT, 0);
        }
    }
}
