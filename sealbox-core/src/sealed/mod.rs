//! Password-sealed single-file container.
//!
//! # File structure
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            BoxHeader (24 bytes)          │  offset 0
//! │        salt (16) + table size (8)        │
//! ├──────────────────────────────────────────┤
//! │                                          │
//! │        Table region (2 MiB, fixed)       │  offset 24
//! │   sealed file table, zero-padded tail,   │
//! │         rewritten in place               │
//! │                                          │
//! ├──────────────────────────────────────────┤
//! │                                          │
//! │       Content area (append-only)         │  offset 24 + 2 MiB
//! │     independently sealed file blobs      │
//! │                                          │
//! └──────────────────────────────────────────┘
//! ```
//!
//! The table key seals the file table; the content key seals each file blob.
//! Both are derived from the password-based master key under distinct
//! contexts, and the master key never survives key derivation.

mod file;
mod format;
mod header;
mod memory;
mod store;
mod table;

pub use file::{create_container, BoxEntry, DirectoryRef, SealedBox};
pub use format::{CONTENT_BASE, HEADER_LEN, TABLE_REGION_LEN};
pub use header::BoxHeader;
pub use memory::MemoryStore;
pub use store::{BoxStore, FsStore};
pub use table::ContentHash;
