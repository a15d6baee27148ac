//! Direct I/O against a real file.
//!
//! Runs under the cargo target directory because tmpfs, the usual home of
//! `/tmp`, rejects `O_DIRECT` with `EINVAL`. Filesystems that do the same are
//! skipped rather than failed.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use blkbench_io::{AlignedBuffer, FileHandle, IoBackend, IoError, OpenFlags, SyncBackend};

fn open_direct(backend: &SyncBackend, path: &Path) -> Option<FileHandle> {
    match backend.open(path, OpenFlags::direct()) {
        Ok(handle) => Some(handle),
        Err(IoError::Io { source }) if source.kind() == ErrorKind::InvalidInput => {
            eprintln!("skipping: O_DIRECT not supported under {}", path.display());
            None
        }
        Err(e) => panic!("open failed: {e}"),
    }
}

#[test]
fn aligned_buffer_roundtrip_with_o_direct() {
    let dir = tempfile::tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
    let path = dir.path().join("direct.img");
    File::create(&path).unwrap().set_len(1024 * 1024).unwrap();

    let backend = SyncBackend::new();
    let Some(mut handle) = open_direct(&backend, &path) else {
        return;
    };
    assert!(handle.is_direct());

    let sector = backend.sector_size(&handle).unwrap();
    assert!(sector.is_power_of_two());
    let block = sector * 16;

    let mut out = AlignedBuffer::new(block, sector).unwrap();
    assert!(out.is_aligned_to(sector));
    for (i, byte) in out.as_mut_slice().iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }

    let offset = block as u64 * 3;
    backend.seek(&mut handle, offset).unwrap();
    assert_eq!(backend.write(&mut handle, out.as_slice()).unwrap(), block);
    backend.sync_data(&handle).unwrap();

    let mut back = AlignedBuffer::new(block, sector).unwrap();
    backend.seek(&mut handle, offset).unwrap();
    assert_eq!(backend.read(&mut handle, back.as_mut_slice()).unwrap(), block);
    assert_eq!(back.as_slice(), out.as_slice());

    backend.close(handle).unwrap();
}
