// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Byte-level access to stored audio files.
///
/// Reads may return fewer bytes than requested. A read of zero bytes is the end of
/// the file.
pub trait Storage {
    /// An open file.
    type Handle;

    /// Opens the file at the given path.
    fn open(&mut self, path: &Path) -> io::Result<Self::Handle>;

    /// Reads up to `buf.len()` bytes and returns how many were read.
    fn read(&mut self, handle: &mut Self::Handle, buf: &mut [u8]) -> io::Result<usize>;

    /// Moves to an absolute byte offset.
    fn seek(&mut self, handle: &mut Self::Handle, offset: u64) -> io::Result<()>;

    /// Releases the file.
    fn close(&mut self, handle: Self::Handle);
}

/// Storage backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    type Handle = File;

    fn open(&mut self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn read(&mut self, handle: &mut File, buf: &mut [u8]) -> io::Result<usize> {
        handle.read(buf)
    }

    fn seek(&mut self, handle: &mut File, offset: u64) -> io::Result<()> {
        handle.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    fn close(&mut self, handle: File) {
        drop(handle);
    }
}

/// An open in-memory file.
#[derive(Debug)]
pub struct MemoryHandle {
    data: Arc<Vec<u8>>,
    position: usize,
}

/// Named files held in memory. Reads and seeks can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: HashMap<PathBuf, Arc<Vec<u8>>>,
    fail_reads: bool,
    fail_seeks: bool,
    open_handles: usize,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    /// Adds or replaces a file.
    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, data: Vec<u8>) {
        self.files.insert(path.into(), Arc::new(data));
    }

    /// Makes every subsequent read fail.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Makes every subsequent seek fail.
    pub fn set_fail_seeks(&mut self, fail: bool) {
        self.fail_seeks = fail;
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.open_handles
    }
}

impl Storage for MemoryStorage {
    type Handle = MemoryHandle;

    fn open(&mut self, path: &Path) -> io::Result<MemoryHandle> {
        let data = self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })?;
        self.open_handles += 1;
        Ok(MemoryHandle { data, position: 0 })
    }

    fn read(&mut self, handle: &mut MemoryHandle, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::other("read failed"));
        }
        let remaining = handle.data.get(handle.position..).unwrap_or_default();
        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        handle.position += count;
        Ok(count)
    }

    fn seek(&mut self, handle: &mut MemoryHandle, offset: u64) -> io::Result<()> {
        if self.fail_seeks {
            return Err(io::Error::other("seek failed"));
        }
        handle.position = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(())
    }

    fn close(&mut self, handle: MemoryHandle) {
        drop(handle);
        self.open_handles = self.open_handles.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_read_and_seek() {
        let mut storage = MemoryStorage::new();
        storage.insert("a.wav", vec![1, 2, 3, 4, 5]);

        let mut handle = storage.open(Path::new("a.wav")).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(storage.read(&mut handle, &mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(storage.read(&mut handle, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(storage.read(&mut handle, &mut buf).unwrap(), 0);

        storage.seek(&mut handle, 1).unwrap();
        assert_eq!(storage.read(&mut handle, &mut buf).unwrap(), 3);
        assert_eq!(buf, [2, 3, 4]);

        // Past the end reads nothing.
        storage.seek(&mut handle, 100).unwrap();
        assert_eq!(storage.read(&mut handle, &mut buf).unwrap(), 0);

        assert_eq!(storage.open_handles(), 1);
        storage.close(handle);
        assert_eq!(storage.open_handles(), 0);
    }

    #[test]
    fn test_memory_missing_file() {
        let mut storage = MemoryStorage::new();
        let err = storage.open(Path::new("missing.wav")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_fault_injection() {
        let mut storage = MemoryStorage::new();
        storage.insert("a.wav", vec![0; 8]);
        let mut handle = storage.open(Path::new("a.wav")).unwrap();

        storage.set_fail_reads(true);
        assert!(storage.read(&mut handle, &mut [0u8; 4]).is_err());
        storage.set_fail_seeks(true);
        assert!(storage.seek(&mut handle, 0).is_err());

        storage.set_fail_reads(false);
        assert_eq!(storage.read(&mut handle, &mut [0u8; 4]).unwrap(), 4);
    }

    #[test]
    fn test_fs_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        File::create(&path)
            .unwrap()
            .write_all(&[9, 8, 7, 6])
            .unwrap();

        let mut storage = FsStorage;
        let mut handle = storage.open(&path).unwrap();
        storage.seek(&mut handle, 2).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(storage.read(&mut handle, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[7, 6]);
        storage.close(handle);

        let err = storage.open(&dir.path().join("nope.bin")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
