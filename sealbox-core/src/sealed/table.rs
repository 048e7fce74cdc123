//! In-memory decrypted model of the container metadata.
//!
//! The file table holds the flat content list (hash, offset, length, deleted
//! flag) and the directory tree. The tree is kept as an arena of nodes
//! addressed by stable indices, root at index 0, and is mutated in place
//! through those indices. A hash-to-position index over the content list is
//! derived data: rebuilt by a linear scan on every load, never persisted,
//! and rebuildable from the content list at any point.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{BoxError, BoxResult};

use super::format::HASH_LEN;

/// Index of a directory node in the table's arena.
pub(crate) type NodeId = u32;

/// The arena index of the root directory.
pub(crate) const ROOT_NODE: NodeId = 0;

/// SHA-256 hash identifying one stored file content.
///
/// Multiple directory entries may reference the same hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; HASH_LEN]);

impl ContentHash {
    /// Computes the hash of `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; HASH_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Converts the hash to a hexadecimal string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One entry of the flat content list.
///
/// `offset` is relative to the content area. Entries are append-only and
/// never overwritten. The `deleted` flag is persisted for soft-deletion but
/// no operation sets it yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ContentEntry {
    /// Hash of the plaintext contents.
    pub hash: ContentHash,
    /// Byte offset into the content area.
    pub offset: u64,
    /// Byte length of the sealed blob.
    pub len: u64,
    /// Soft-deletion marker.
    pub deleted: bool,
}

/// A named reference from a directory to stored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FileRef {
    /// File name within its directory.
    pub name: String,
    /// Hash of the referenced content.
    pub hash: ContentHash,
}

/// One directory node of the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DirNode {
    /// Directory name; empty only for the root.
    pub name: String,
    /// Files in this directory.
    pub files: Vec<FileRef>,
    /// Arena indices of the subdirectories.
    pub children: Vec<NodeId>,
}

impl DirNode {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// The decrypted container metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FileTable {
    /// Display name of the container.
    pub name: String,
    /// Byte offset of the content area in the container file.
    pub content_base: u64,
    /// Current byte length of the content area.
    pub content_len: u64,
    /// Flat, append-only content list.
    pub entries: Vec<ContentEntry>,
    /// Directory arena; the root lives at index 0.
    pub nodes: Vec<DirNode>,
    /// Derived hash-to-position lookup over `entries`; rebuilt on load.
    #[serde(skip)]
    index: HashMap<ContentHash, usize>,
}

impl FileTable {
    /// Builds an empty table with only the root directory.
    pub fn empty(name: &str, content_base: u64) -> Self {
        Self {
            name: name.to_string(),
            content_base,
            content_len: 0,
            entries: Vec::new(),
            nodes: vec![DirNode::named("")],
            index: HashMap::new(),
        }
    }

    /// Serializes the table to CBOR.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Serialization`] when encoding fails.
    pub fn to_bytes(&self) -> BoxResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)
            .map_err(|err| BoxError::serialization(err.to_string()))?;
        Ok(bytes)
    }

    /// Deserializes a table from CBOR and rebuilds the hash index.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::InvalidContainer`] when the bytes do not decode
    /// into a table with a root node.
    pub fn from_bytes(bytes: &[u8]) -> BoxResult<Self> {
        let mut table: Self = ciborium::de::from_reader(bytes)
            .map_err(|err| BoxError::invalid_container(format!("file table: {err}")))?;
        if table.nodes.is_empty() {
            return Err(BoxError::invalid_container("file table has no root node"));
        }
        table.rebuild_index();
        Ok(table)
    }

    /// Rebuilds the hash index by a linear scan over the content list.
    fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.hash, position))
            .collect();
    }

    /// Looks up a content entry by hash through the derived index.
    pub fn content_entry(&self, hash: ContentHash) -> Option<&ContentEntry> {
        self.index.get(&hash).map(|&position| &self.entries[position])
    }

    /// Returns the node at `id`.
    ///
    /// Arena indices are created by this table and never removed, so a held
    /// `NodeId` is always in bounds.
    pub fn node(&self, id: NodeId) -> &DirNode {
        &self.nodes[id as usize]
    }

    /// Resolves a `/`-separated path to a node, walking from the root.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::DirectoryDoesNotExist`] when any component is
    /// missing.
    pub fn resolve(&self, path: &str) -> BoxResult<NodeId> {
        let mut current = ROOT_NODE;
        for component in components(path) {
            current = self
                .node(current)
                .children
                .iter()
                .copied()
                .find(|&child| self.node(child).name == component)
                .ok_or_else(|| BoxError::DirectoryDoesNotExist {
                    path: path.to_string(),
                })?;
        }
        Ok(current)
    }

    /// Returns an error if `name` is already taken by a file or a
    /// subdirectory of `node`.
    pub fn ensure_vacant(&self, node: NodeId, name: &str) -> BoxResult<()> {
        let dir = self.node(node);
        let taken = dir.files.iter().any(|file| file.name == name)
            || dir
                .children
                .iter()
                .any(|&child| self.node(child).name == name);
        if taken {
            return Err(BoxError::NameAlreadyExists {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Stages a new file: content-list entry, index entry, directory
    /// reference, and the content-area length bump.
    ///
    /// The caller has already validated the name and vacancy.
    pub fn stage_file(&mut self, node: NodeId, name: &str, hash: ContentHash, sealed_len: u64) {
        self.entries.push(ContentEntry {
            hash,
            offset: self.content_len,
            len: sealed_len,
            deleted: false,
        });
        self.index.insert(hash, self.entries.len() - 1);
        self.nodes[node as usize].files.push(FileRef {
            name: name.to_string(),
            hash,
        });
        self.content_len += sealed_len;
    }

    /// Reverts the most recent [`Self::stage_file`].
    pub fn unstage_file(&mut self, node: NodeId) {
        if let Some(entry) = self.entries.pop() {
            self.content_len -= entry.len;
        }
        self.nodes[node as usize].files.pop();
        // A duplicate of the popped hash may still exist earlier in the
        // content list; rebuilding keeps the index exact.
        self.rebuild_index();
    }

    /// Stages a new empty subdirectory and returns its arena index.
    ///
    /// The caller has already validated the name and vacancy.
    ///
    /// # Panics
    ///
    /// This function will not panic before the arena reaches `u32::MAX`
    /// nodes, which the 2 MiB table region rules out.
    pub fn stage_directory(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId::try_from(self.nodes.len()).expect("arena outgrew the table region");
        self.nodes.push(DirNode::named(name));
        self.nodes[parent as usize].children.push(id);
        id
    }

    /// Reverts the most recent [`Self::stage_directory`].
    pub fn unstage_directory(&mut self, parent: NodeId) {
        self.nodes[parent as usize].children.pop();
        self.nodes.pop();
    }
}

/// Validates a file or directory name.
///
/// # Errors
///
/// Returns [`BoxError::InvalidName`] for empty names, path separators, and
/// the dot components.
pub(crate) fn validate_name(name: &str) -> BoxResult<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains('/') {
        Some("name contains a path separator")
    } else if name == "." || name == ".." {
        Some("name is a dot component")
    } else {
        None
    };

    reason.map_or(Ok(()), |reason| {
        Err(BoxError::InvalidName {
            name: name.to_string(),
            reason,
        })
    })
}

/// Splits a `/`-separated path into its non-empty components.
pub(crate) fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|component| !component.is_empty())
}

/// Joins a directory path and an entry name into a fully-qualified path.
pub(crate) fn join_path(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}
