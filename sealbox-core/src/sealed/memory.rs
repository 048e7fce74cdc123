//! In-memory store implementation.
//!
//! Simulates a random-access file over a `Vec<u8>`. Meant for tests and for
//! callers that assemble a container in memory before persisting it
//! themselves; it provides no durability.

use std::sync::RwLock;

use crate::error::{BoxError, BoxResult};

use super::store::BoxStore;

/// Vec-backed store simulating a random-access file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of the current contents.
    ///
    /// # Panics
    ///
    /// Panics if the inner lock is poisoned, which requires a previous panic
    /// while writing.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().expect("store lock poisoned").clone()
    }

    fn read_lock(&self) -> BoxResult<std::sync::RwLockReadGuard<'_, Vec<u8>>> {
        self.data
            .read()
            .map_err(|_| BoxError::io("locking memory store", std::io::Error::other("poisoned")))
    }

    fn write_lock(&self) -> BoxResult<std::sync::RwLockWriteGuard<'_, Vec<u8>>> {
        self.data
            .write()
            .map_err(|_| BoxError::io("locking memory store", std::io::Error::other("poisoned")))
    }
}

impl BoxStore for MemoryStore {
    fn len(&self) -> BoxResult<u64> {
        Ok(self.read_lock()?.len() as u64)
    }

    fn read_at(&self, offset: u64, len: usize) -> BoxResult<Vec<u8>> {
        let data = self.read_lock()?;
        let start = usize::try_from(offset)
            .map_err(|_| BoxError::io("read offset", std::io::Error::other("offset overflow")))?;
        let end = start.saturating_add(len);
        if end > data.len() {
            return Err(BoxError::io(
                format!("reading {len} bytes at {offset}"),
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "read past end of store"),
            ));
        }
        Ok(data[start..end].to_vec())
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> BoxResult<()> {
        let mut data = self.write_lock()?;
        let start = usize::try_from(offset)
            .map_err(|_| BoxError::io("write offset", std::io::Error::other("offset overflow")))?;
        let end = start.saturating_add(bytes.len());
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn sync(&self) -> BoxResult<()> {
        Ok(())
    }
}
