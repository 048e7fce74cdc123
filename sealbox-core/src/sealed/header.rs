//! Container header encoding.
//!
//! The header is the only plaintext part of a sealed box: the password salt
//! followed by the current size of the table ciphertext. Its size is a fixed
//! constant, so it can be read before any key material exists.

use crate::crypto::kdf::SALT_LEN;
use crate::error::{BoxError, BoxResult};

use super::format::HEADER_LEN;

/// Plaintext container header.
///
/// # Binary Layout (24 bytes)
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       16    salt
/// 16      8     table_len (u64 LE)
/// ```
///
/// Invariant: `table_len` always equals the byte length of the table
/// ciphertext actually stored in the reserved table region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxHeader {
    /// Per-container password salt, generated at creation.
    pub salt: [u8; SALT_LEN],
    /// Current size of the sealed file table in bytes.
    pub table_len: u64,
}

impl BoxHeader {
    /// Creates a new header.
    #[must_use]
    pub const fn new(salt: [u8; SALT_LEN], table_len: u64) -> Self {
        Self { salt, table_len }
    }

    /// Encodes the header to bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..SALT_LEN].copy_from_slice(&self.salt);
        buf[SALT_LEN..HEADER_LEN].copy_from_slice(&self.table_len.to_le_bytes());
        buf
    }

    /// Decodes a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::InvalidContainer`] if the buffer is shorter than
    /// the fixed header size.
    pub fn decode(bytes: &[u8]) -> BoxResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(BoxError::invalid_container("file shorter than header"));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[0..SALT_LEN]);

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[SALT_LEN..HEADER_LEN]);
        let table_len = u64::from_le_bytes(len_bytes);

        Ok(Self { salt, table_len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let header = BoxHeader::new([0x42u8; SALT_LEN], 1_234_567);
        let encoded = header.encode();
        assert_eq!(encoded.len(), HEADER_LEN);

        let decoded = BoxHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_layout() {
        let header = BoxHeader::new([0xAAu8; SALT_LEN], 0x0102_0304);
        let encoded = header.encode();
        assert_eq!(&encoded[0..SALT_LEN], &[0xAAu8; SALT_LEN]);
        // Little-endian size field right after the salt.
        assert_eq!(&encoded[SALT_LEN..], &[0x04, 0x03, 0x02, 0x01, 0, 0, 0, 0]);
    }

    #[test]
    fn test_header_too_short() {
        let result = BoxHeader::decode(&[0u8; HEADER_LEN - 1]);
        assert!(matches!(result, Err(BoxError::InvalidContainer { .. })));
    }
}
