#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

//! Password-sealed single-file container engine.
//!
//! A sealed box stores a directory tree of encrypted files inside one
//! container file: a plaintext header (salt + table size), a fixed reserved
//! region holding the AEAD-sealed file table, and an append-only content
//! area of independently sealed file payloads. Keys are derived from the
//! password with Argon2id and split into independent table and content
//! subkeys via HKDF-SHA256 context separation.
//!
//! The crate also ships a standalone envelope primitive
//! ([`envelope::encrypt`]/[`envelope::decrypt`]) for one-shot
//! blob-plus-metadata protection under the same key derivation.
//!
//! The container format is single-writer and not crash-safe; see
//! [`sealed`] for the exact write ordering.
//!
//! # Example
//!
//! ```
//! use sealbox_core::{create_container, BoxResult, MemoryStore, SealedBox};
//!
//! fn main() -> BoxResult<()> {
//!     let bytes = create_container("vault", "Str0ng!Pwd12")?;
//!     let mut sealed = SealedBox::open(MemoryStore::with_data(bytes), "Str0ng!Pwd12")?;
//!
//!     let root = sealed.root_directory();
//!     sealed.add_file(&root, "notes.txt", b"ciphertext at rest")?;
//!
//!     assert_eq!(sealed.read_file(&root, "notes.txt")?, b"ciphertext at rest");
//!     assert_eq!(sealed.stat(&root)?.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod sealed;
pub mod strength;

pub use envelope::{Ciphertext, CiphertextPayload};
pub use error::{BoxError, BoxResult};
pub use sealed::{
    create_container, BoxEntry, BoxStore, ContentHash, DirectoryRef, FsStore, MemoryStore,
    SealedBox,
};
pub use strength::PasswordStrength;
