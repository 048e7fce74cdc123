//! Authenticated encryption for table and content blobs.
//!
//! XChaCha20-Poly1305 with a fresh random 24-byte nonce per seal. Sealed
//! blob wire format:
//!
//! ```text
//! [ nonce (24 bytes) | ciphertext + tag (16 bytes) ]
//! ```
//!
//! The blob is opaque to every caller; no associated data is bound. Key
//! separation between the table and content blobs is carried entirely by the
//! subkey contexts in [`crate::crypto::kdf`].

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::crypto::kdf::KEY_LEN;
use crate::error::{BoxError, BoxResult};

/// Length of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Fixed overhead of a sealed blob over its plaintext.
pub const SEAL_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// Seals `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns [`BoxError::Crypto`] if the cipher rejects the input (only
/// possible for plaintexts beyond the XChaCha20 length limit).
///
/// # Panics
///
/// This function will not panic: the key length is always 32 bytes by
/// construction.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> BoxResult<Vec<u8>> {
    let cipher =
        XChaCha20Poly1305::new_from_slice(key).expect("key length is always 32");

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| BoxError::crypto("AEAD seal failed"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens a sealed blob produced by [`seal`].
///
/// # Errors
///
/// Returns [`BoxError::WrongPasswordOrCorrupt`] when the blob is too short
/// to carry a nonce and tag, or when authentication fails. Wrong key and
/// tampered ciphertext are deliberately indistinguishable.
///
/// # Panics
///
/// This function will not panic: the key length is always 32 bytes by
/// construction.
pub fn open(key: &[u8; KEY_LEN], blob: &[u8]) -> BoxResult<Vec<u8>> {
    if blob.len() < SEAL_OVERHEAD {
        return Err(BoxError::WrongPasswordOrCorrupt);
    }

    let cipher =
        XChaCha20Poly1305::new_from_slice(key).expect("key length is always 32");

    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| BoxError::WrongPasswordOrCorrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> [u8; KEY_LEN] {
        [byte; KEY_LEN]
    }

    #[test]
    fn test_seal_open_round_trip() {
        let k = key(0x11);
        let blob = seal(&k, b"sealed box content").unwrap();
        assert_eq!(blob.len(), b"sealed box content".len() + SEAL_OVERHEAD);

        let plain = open(&k, &blob).unwrap();
        assert_eq!(plain, b"sealed box content");
    }

    #[test]
    fn test_seal_is_randomized() {
        let k = key(0x11);
        let first = seal(&k, b"same plaintext").unwrap();
        let second = seal(&k, b"same plaintext").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let blob = seal(&key(0x11), b"secret").unwrap();
        let result = open(&key(0x22), &blob);
        assert!(matches!(result, Err(BoxError::WrongPasswordOrCorrupt)));
    }

    #[test]
    fn test_open_tampered_blob_fails() {
        let k = key(0x11);
        let mut blob = seal(&k, b"secret").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        assert!(matches!(
            open(&k, &blob),
            Err(BoxError::WrongPasswordOrCorrupt)
        ));
    }

    #[test]
    fn test_open_short_blob_fails() {
        let result = open(&key(0x11), &[0u8; SEAL_OVERHEAD - 1]);
        assert!(matches!(result, Err(BoxError::WrongPasswordOrCorrupt)));
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let k = key(0x33);
        let blob = seal(&k, b"").unwrap();
        assert_eq!(blob.len(), SEAL_OVERHEAD);
        assert_eq!(open(&k, &blob).unwrap(), b"");
    }
}
