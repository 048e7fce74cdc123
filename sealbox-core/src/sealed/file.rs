//! Sealed container engine.
//!
//! Orchestrates the header, the key hierarchy, the encrypted file table and
//! the append-only content area behind the public create/open/add/stat
//! operations.
//!
//! # Mutation ordering
//!
//! A mutation performs three separate writes to the same file: the sealed
//! content blob (for `add_file`), the table ciphertext over the reserved
//! region, and the header's size field. There is no write-ahead log and no
//! atomic rename; a crash between the writes leaves either orphaned content
//! (recoverable by rescanning) or a torn table. The capacity check on the
//! re-sealed table happens before the first write, so capacity failures
//! leave both the file and the in-memory table untouched.

// Binary offsets use small constant casts that are safe.
#![allow(clippy::cast_possible_truncation)]

use crate::crypto::{aead, kdf, BoxKey};
use crate::error::{BoxError, BoxResult};

use super::format::{
    CONTENT_BASE, CONTENT_KEY_CONTEXT, CONTENT_KEY_INDEX, HEADER_LEN, TABLE_KEY_CONTEXT,
    TABLE_KEY_INDEX, TABLE_LEN_OFFSET, TABLE_REGION_LEN,
};
use super::header::BoxHeader;
use super::store::BoxStore;
use super::table::{components, join_path, validate_name, ContentHash, FileTable};

/// Detached reference to a directory inside a sealed box.
///
/// Carries the fully-qualified path; every operation re-resolves it against
/// the current table by walking the tree from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRef {
    path: String,
}

impl DirectoryRef {
    fn root() -> Self {
        Self {
            path: "/".to_string(),
        }
    }

    fn child(&self, name: &str) -> Self {
        Self {
            path: join_path(&self.path, name),
        }
    }

    /// Builds a reference to `path` without checking that it exists.
    ///
    /// References are resolved on every use: an operation on a path that
    /// does not exist in the table fails with
    /// [`BoxError::DirectoryDoesNotExist`]. Separators are normalized, so
    /// `"docs"`, `"/docs"` and `"/docs/"` reference the same directory.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let mut normalized = String::from("/");
        normalized.push_str(&components(path).collect::<Vec<_>>().join("/"));
        Self { path: normalized }
    }

    /// Returns the fully-qualified directory path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxEntry {
    /// A stored file.
    File {
        /// Fully-qualified path of the file.
        path: String,
        /// Hash of the file's contents.
        hash: ContentHash,
    },
    /// A subdirectory.
    Directory {
        /// Fully-qualified path of the directory.
        path: String,
    },
}

impl BoxEntry {
    /// Returns the fully-qualified path of the entry.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Directory { path } => path,
        }
    }
}

/// Builds the initial bytes of a new sealed container.
///
/// The result is `header || sealed empty table || zero padding`, exactly
/// [`CONTENT_BASE`] bytes: a container with an empty root directory and an
/// empty content area. Write the bytes somewhere and open them with the same
/// password to start adding files.
///
/// The master key derived from the password is zeroized before this function
/// returns; only the table key is used, and it does not outlive the call.
///
/// # Errors
///
/// - [`BoxError::EmptyPassword`] when `password` is empty.
/// - [`BoxError::TableTooLarge`] when the sealed empty table exceeds the
///   reserved table region (only possible for an absurdly long `name`).
/// - [`BoxError::KeyDerivation`] when the password hashing primitive is
///   unavailable.
pub fn create_container(name: &str, password: &str) -> BoxResult<Vec<u8>> {
    if password.is_empty() {
        return Err(BoxError::EmptyPassword);
    }

    let salt = kdf::generate_salt();
    let master = kdf::derive_master_key(password, &salt)?;
    let table_key = kdf::derive_subkey(&master, TABLE_KEY_INDEX, TABLE_KEY_CONTEXT);
    drop(master);

    let table = FileTable::empty(name, CONTENT_BASE);
    let sealed = aead::seal(table_key.as_bytes(), &table.to_bytes()?)?;
    if sealed.len() > TABLE_REGION_LEN {
        return Err(BoxError::TableTooLarge { len: sealed.len() });
    }

    let header = BoxHeader::new(salt, sealed.len() as u64);
    let mut out = vec![0u8; CONTENT_BASE as usize];
    out[..HEADER_LEN].copy_from_slice(&header.encode());
    out[HEADER_LEN..HEADER_LEN + sealed.len()].copy_from_slice(&sealed);

    tracing::debug!(name, "created sealed container");
    Ok(out)
}

/// Handle to an open sealed container.
///
/// Owns the underlying store, the two subkeys and the decrypted file table
/// for its whole lifetime. Both subkeys are zeroized when the box is closed
/// or dropped, including on every error path; there is no closed-but-alive
/// state in which an operation could be misused.
///
/// Not thread-safe: the container format assumes a single writer.
pub struct SealedBox<S: BoxStore> {
    store: S,
    table_key: BoxKey,
    content_key: BoxKey,
    table: FileTable,
}

impl<S: BoxStore> SealedBox<S> {
    /// Opens a sealed container from `store` with `password`.
    ///
    /// Reads the header, derives the table and content keys (zeroizing the
    /// master key before returning), decrypts and deserializes the file
    /// table, and rebuilds the hash index.
    ///
    /// # Errors
    ///
    /// - [`BoxError::InvalidContainer`] when the store is shorter than the
    ///   header, the stored table size exceeds the reserved region, or the
    ///   decrypted table does not deserialize.
    /// - [`BoxError::WrongPasswordOrCorrupt`] when table authentication
    ///   fails; wrong password and corruption are indistinguishable.
    /// - [`BoxError::Io`] when reading from the store fails.
    /// - [`BoxError::KeyDerivation`] when the password hashing primitive is
    ///   unavailable.
    pub fn open(store: S, password: &str) -> BoxResult<Self> {
        if store.len()? < HEADER_LEN as u64 {
            return Err(BoxError::invalid_container("file shorter than header"));
        }

        let header = BoxHeader::decode(&store.read_at(0, HEADER_LEN)?)?;
        if header.table_len > TABLE_REGION_LEN as u64 {
            return Err(BoxError::invalid_container(
                "stored table size exceeds the reserved table region",
            ));
        }

        let master = kdf::derive_master_key(password, &header.salt)?;
        let table_key = kdf::derive_subkey(&master, TABLE_KEY_INDEX, TABLE_KEY_CONTEXT);
        let content_key = kdf::derive_subkey(&master, CONTENT_KEY_INDEX, CONTENT_KEY_CONTEXT);
        drop(master);

        let blob = store.read_at(HEADER_LEN as u64, header.table_len as usize)?;
        let plain = aead::open(table_key.as_bytes(), &blob)?;
        let table = FileTable::from_bytes(&plain)?;

        tracing::debug!(
            name = %table.name,
            entries = table.entries.len(),
            "opened sealed container"
        );

        Ok(Self {
            store,
            table_key,
            content_key,
            table,
        })
    }

    /// Returns the container's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.table.name
    }

    /// Returns a reference to the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the root directory.
    #[must_use]
    pub fn root_directory(&self) -> DirectoryRef {
        DirectoryRef::root()
    }

    /// Lists the entries of `dir` as fully-qualified paths.
    ///
    /// A pure projection of the in-memory table; performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::DirectoryDoesNotExist`] when `dir` does not
    /// resolve.
    pub fn stat(&self, dir: &DirectoryRef) -> BoxResult<Vec<BoxEntry>> {
        let node = self.table.resolve(dir.path())?;
        let dir_node = self.table.node(node);

        let mut entries = Vec::with_capacity(dir_node.files.len() + dir_node.children.len());
        for file in &dir_node.files {
            entries.push(BoxEntry::File {
                path: join_path(dir.path(), &file.name),
                hash: file.hash,
            });
        }
        for &child in &dir_node.children {
            entries.push(BoxEntry::Directory {
                path: join_path(dir.path(), &self.table.node(child).name),
            });
        }
        Ok(entries)
    }

    /// Adds a file to `dir`, sealing `contents` with the content key.
    ///
    /// Appends the sealed blob to the content area, records it in the
    /// content list and the directory, then rewrites the table region and
    /// the header size field in place. See the module docs for the write
    /// ordering and its crash behavior.
    ///
    /// # Errors
    ///
    /// - [`BoxError::InvalidName`] for unusable names.
    /// - [`BoxError::DirectoryDoesNotExist`] when `dir` does not resolve.
    /// - [`BoxError::NameAlreadyExists`] when the directory already has an
    ///   entry with this name.
    /// - [`BoxError::MaxTableSizeExceeded`] when the grown table no longer
    ///   fits the reserved region; detected before any write, leaving the
    ///   container untouched.
    /// - [`BoxError::Io`] when one of the writes fails.
    pub fn add_file(
        &mut self,
        dir: &DirectoryRef,
        name: &str,
        contents: &[u8],
    ) -> BoxResult<DirectoryRef> {
        validate_name(name)?;
        let node = self.table.resolve(dir.path())?;
        self.table.ensure_vacant(node, name)?;

        let hash = ContentHash::of(contents);
        let sealed_content = aead::seal(self.content_key.as_bytes(), contents)?;
        let offset = self.table.content_len;

        self.table
            .stage_file(node, name, hash, sealed_content.len() as u64);

        let sealed_table = match self.seal_table() {
            Ok(blob) => blob,
            Err(err) => {
                self.table.unstage_file(node);
                return Err(err);
            }
        };

        if let Err(err) = self
            .store
            .write_at(self.table.content_base + offset, &sealed_content)
        {
            self.table.unstage_file(node);
            return Err(err);
        }
        self.commit_table(&sealed_table)?;

        tracing::debug!(
            dir = dir.path(),
            name,
            bytes = contents.len(),
            hash = %hash,
            "added file"
        );
        Ok(dir.clone())
    }

    /// Creates an empty subdirectory of `dir`.
    ///
    /// Directories only come into existence through this operation; the
    /// format defines no delete or rename.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_file`], minus the content write.
    pub fn add_directory(&mut self, dir: &DirectoryRef, name: &str) -> BoxResult<DirectoryRef> {
        validate_name(name)?;
        let node = self.table.resolve(dir.path())?;
        self.table.ensure_vacant(node, name)?;

        self.table.stage_directory(node, name);

        let sealed_table = match self.seal_table() {
            Ok(blob) => blob,
            Err(err) => {
                self.table.unstage_directory(node);
                return Err(err);
            }
        };
        self.commit_table(&sealed_table)?;

        tracing::debug!(dir = dir.path(), name, "added directory");
        Ok(dir.child(name))
    }

    /// Reads and decrypts the contents of a file in `dir`.
    ///
    /// The plaintext is re-hashed and compared against the hash recorded in
    /// the directory entry, so a blob swapped for another valid blob is
    /// still rejected.
    ///
    /// # Errors
    ///
    /// - [`BoxError::DirectoryDoesNotExist`] when `dir` does not resolve.
    /// - [`BoxError::FileDoesNotExist`] when the directory has no file with
    ///   this name.
    /// - [`BoxError::WrongPasswordOrCorrupt`] when blob authentication
    ///   fails.
    /// - [`BoxError::InvalidContainer`] when the table invariant is broken
    ///   or the plaintext does not match its recorded hash.
    /// - [`BoxError::Io`] when reading from the store fails.
    pub fn read_file(&self, dir: &DirectoryRef, name: &str) -> BoxResult<Vec<u8>> {
        let node = self.table.resolve(dir.path())?;
        let file = self
            .table
            .node(node)
            .files
            .iter()
            .find(|file| file.name == name)
            .ok_or_else(|| BoxError::FileDoesNotExist {
                name: name.to_string(),
            })?;

        let entry = self.table.content_entry(file.hash).ok_or_else(|| {
            BoxError::invalid_container("directory references a hash missing from the content list")
        })?;

        let blob = self
            .store
            .read_at(self.table.content_base + entry.offset, entry.len as usize)?;
        let plain = aead::open(self.content_key.as_bytes(), &blob)?;

        if ContentHash::of(&plain) != file.hash {
            return Err(BoxError::invalid_container("content hash mismatch"));
        }
        Ok(plain)
    }

    /// Closes the box, zeroizing both subkeys.
    ///
    /// Dropping the box has the same effect; this makes the hand-off
    /// explicit at call sites.
    pub fn close(self) {
        drop(self);
    }

    /// Serializes and seals the current table, enforcing the capacity limit.
    fn seal_table(&self) -> BoxResult<Vec<u8>> {
        let sealed = aead::seal(self.table_key.as_bytes(), &self.table.to_bytes()?)?;
        if sealed.len() > TABLE_REGION_LEN {
            return Err(BoxError::MaxTableSizeExceeded { len: sealed.len() });
        }
        Ok(sealed)
    }

    /// Overwrites the table region in place and updates the header's size
    /// field, then syncs.
    fn commit_table(&self, sealed_table: &[u8]) -> BoxResult<()> {
        self.store.write_at(HEADER_LEN as u64, sealed_table)?;
        self.store
            .write_at(TABLE_LEN_OFFSET, &(sealed_table.len() as u64).to_le_bytes())?;
        self.store.sync()
    }
}

impl<S: BoxStore> std::fmt::Debug for SealedBox<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedBox")
            .field("name", &self.table.name)
            .field("entries", &self.table.entries.len())
            .finish_non_exhaustive()
    }
}
