//! Storage abstraction for the container file.
//!
//! The engine is written against a small random-access trait so the same
//! code runs over a real file or an in-memory buffer in tests. An open
//! [`super::SealedBox`] owns its store exclusively for its whole lifetime;
//! no locking protocol is defined for concurrent writers.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{BoxError, BoxResult};

/// Random-access storage backing one sealed container.
///
/// Methods take `&self`; implementations use interior mutability.
pub trait BoxStore {
    /// Returns the current length in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Io`] when the underlying storage fails.
    fn len(&self) -> BoxResult<u64>;

    /// Returns `true` if the store holds no bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Io`] when the underlying storage fails.
    fn is_empty(&self) -> BoxResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Io`] when the range is not fully available or the
    /// underlying storage fails.
    fn read_at(&self, offset: u64, len: usize) -> BoxResult<Vec<u8>>;

    /// Writes all of `bytes` at `offset`, extending the store if needed.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Io`] when the underlying storage fails.
    fn write_at(&self, offset: u64, bytes: &[u8]) -> BoxResult<()>;

    /// Flushes buffered writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Io`] when the underlying storage fails.
    fn sync(&self) -> BoxResult<()>;
}

/// File-backed store.
pub struct FsStore {
    file: Mutex<File>,
}

impl FsStore {
    /// Opens an existing container file for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Io`] when the file cannot be opened.
    pub fn open(path: &Path) -> BoxResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| BoxError::io(format!("opening {}", path.display()), err))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Creates a container file at `path` with the given initial bytes.
    ///
    /// Fails if a file already exists there; a sealed box is never silently
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Io`] when the file exists or cannot be written.
    pub fn create(path: &Path, bytes: &[u8]) -> BoxResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| BoxError::io(format!("creating {}", path.display()), err))?;
        file.write_all(bytes)
            .map_err(|err| BoxError::io("writing initial container bytes", err))?;
        file.sync_all()
            .map_err(|err| BoxError::io("syncing new container", err))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn lock(&self) -> BoxResult<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| BoxError::io("locking file handle", std::io::Error::other("poisoned")))
    }
}

impl BoxStore for FsStore {
    fn len(&self) -> BoxResult<u64> {
        let file = self.lock()?;
        let metadata = file
            .metadata()
            .map_err(|err| BoxError::io("reading file metadata", err))?;
        Ok(metadata.len())
    }

    fn read_at(&self, offset: u64, len: usize) -> BoxResult<Vec<u8>> {
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|err| BoxError::io(format!("seeking to {offset}"), err))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)
            .map_err(|err| BoxError::io(format!("reading {len} bytes at {offset}"), err))?;
        Ok(buf)
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> BoxResult<()> {
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|err| BoxError::io(format!("seeking to {offset}"), err))?;
        file.write_all(bytes)
            .map_err(|err| BoxError::io(format!("writing {} bytes at {offset}", bytes.len()), err))
    }

    fn sync(&self) -> BoxResult<()> {
        self.lock()?
            .sync_all()
            .map_err(|err| BoxError::io("syncing container file", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sealed");

        let store = FsStore::create(&path, b"initial").unwrap();
        assert_eq!(store.len().unwrap(), 7);
        assert_eq!(store.read_at(0, 7).unwrap(), b"initial");

        store.write_at(0, b"updated").unwrap();
        store.write_at(10, b"tail").unwrap();
        store.sync().unwrap();

        assert_eq!(store.len().unwrap(), 14);
        assert_eq!(store.read_at(0, 7).unwrap(), b"updated");
        assert_eq!(store.read_at(10, 4).unwrap(), b"tail");
    }

    #[test]
    fn test_fs_store_create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sealed");

        FsStore::create(&path, b"first").unwrap();
        assert!(matches!(
            FsStore::create(&path, b"second"),
            Err(BoxError::Io { .. })
        ));
    }

    #[test]
    fn test_fs_store_read_past_end_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sealed");

        let store = FsStore::create(&path, b"short").unwrap();
        assert!(matches!(
            store.read_at(0, 100),
            Err(BoxError::Io { .. })
        ));
    }

    #[test]
    fn test_fs_store_reopens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sealed");

        FsStore::create(&path, b"persisted").unwrap();
        let reopened = FsStore::open(&path).unwrap();
        assert_eq!(reopened.read_at(0, 9).unwrap(), b"persisted");
    }
}
