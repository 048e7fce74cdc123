//! Container byte-layout constants.
//!
//! ```text
//! Offset            Size      Field
//! ------            ----      -----
//! 0                 16        salt
//! 16                8         table ciphertext size (u64 LE)
//! 24                2 MiB     reserved table region (sealed file table,
//!                             zero-padded tail)
//! 24 + 2 MiB        ..        content area (append-only sealed blobs)
//! ```
//!
//! All integers are little-endian. The reserved region is a fixed build-time
//! constant so the table can be rewritten in place without relocating the
//! content area; table growth past it is a hard failure, not a resize.

use crate::crypto::kdf::SALT_LEN;

/// Size of the fixed container header: the salt plus the table-size field.
pub const HEADER_LEN: usize = SALT_LEN + 8;

/// Byte offset of the table-size field inside the header.
pub const TABLE_LEN_OFFSET: u64 = SALT_LEN as u64;

/// Fixed size of the reserved table region (2 MiB).
pub const TABLE_REGION_LEN: usize = 2 * 1024 * 1024;

/// Byte offset where the content area begins.
pub const CONTENT_BASE: u64 = (HEADER_LEN + TABLE_REGION_LEN) as u64;

/// Length of a content hash (SHA-256) in bytes.
pub const HASH_LEN: usize = 32;

/// Subkey slot for the table key.
pub const TABLE_KEY_INDEX: u64 = 1;

/// Context label for the table key.
pub const TABLE_KEY_CONTEXT: &str = "Data";

/// Subkey slot for the content key.
pub const CONTENT_KEY_INDEX: u64 = 2;

/// Context label for the content key.
pub const CONTENT_KEY_CONTEXT: &str = "Files";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(HEADER_LEN, 24);
        assert_eq!(TABLE_LEN_OFFSET, 16);
        assert_eq!(CONTENT_BASE, 24 + 2 * 1024 * 1024);
    }

    #[test]
    fn test_subkey_slots_are_distinct() {
        assert_ne!(
            (TABLE_KEY_INDEX, TABLE_KEY_CONTEXT),
            (CONTENT_KEY_INDEX, CONTENT_KEY_CONTEXT)
        );
    }
}
