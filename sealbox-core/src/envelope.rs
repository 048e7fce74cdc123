//! Standalone envelope encryption: one password-sealed blob plus a short
//! UTF-8 metadata string, in a single self-describing byte string.
//!
//! # Wire formats
//!
//! ```text
//! Ciphertext.combined        = salt (16) || sealed payload
//! CiphertextPayload.combined = metadata_len (1) || metadata (UTF-8, <= 255) || payload
//! ```
//!
//! The sealed payload carries its own nonce and tag and is opaque to this
//! format. The salt feeds the same password hashing as the container; the
//! envelope uses the resulting master key directly, without subkeys.

use crate::crypto::{aead, kdf};
use crate::error::{BoxError, BoxResult};
use crate::strength::PasswordStrength;

/// Maximum encoded metadata length in bytes.
pub const METADATA_MAX: usize = 255;

/// Decrypted envelope contents: the raw payload plus its metadata string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextPayload {
    /// The raw payload bytes.
    pub payload: Vec<u8>,
    /// The metadata string, at most [`METADATA_MAX`] bytes of UTF-8.
    pub metadata: String,
}

impl CiphertextPayload {
    /// Builds a payload record, truncating `metadata` to [`METADATA_MAX`]
    /// bytes on a character boundary if it is longer.
    #[must_use]
    pub fn new(payload: Vec<u8>, metadata: &str) -> Self {
        Self {
            payload,
            metadata: truncate_utf8(metadata, METADATA_MAX).to_string(),
        }
    }

    /// Encodes the record as `metadata_len || metadata || payload`.
    #[must_use]
    pub fn combined(&self) -> Vec<u8> {
        let meta = self.metadata.as_bytes();
        debug_assert!(meta.len() <= METADATA_MAX);

        let mut out = Vec::with_capacity(1 + meta.len() + self.payload.len());
        #[allow(clippy::cast_possible_truncation)]
        out.push(meta.len() as u8);
        out.extend_from_slice(meta);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parses a record encoded by [`Self::combined`].
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::MalformedPayload`] when the input is empty, when
    /// it is shorter than its declared metadata length, or when the metadata
    /// bytes are not valid UTF-8.
    pub fn parse(bytes: &[u8]) -> BoxResult<Self> {
        let Some((&meta_len, rest)) = bytes.split_first() else {
            return Err(BoxError::malformed("zero-length payload record"));
        };
        let meta_len = meta_len as usize;

        if rest.len() < meta_len {
            return Err(BoxError::malformed(format!(
                "payload record truncated: {} bytes left for {meta_len}-byte metadata",
                rest.len()
            )));
        }

        let metadata = std::str::from_utf8(&rest[..meta_len])
            .map_err(|_| BoxError::malformed("metadata is not valid UTF-8"))?
            .to_string();

        Ok(Self {
            payload: rest[meta_len..].to_vec(),
            metadata,
        })
    }
}

/// Password-encrypted envelope: the KDF salt plus the sealed payload record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    /// The salt the encryption key was derived with.
    pub salt: [u8; kdf::SALT_LEN],
    /// The sealed payload record, nonce and tag included.
    pub sealed: Vec<u8>,
}

impl Ciphertext {
    /// Encodes the envelope as `salt || sealed`.
    #[must_use]
    pub fn combined(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.salt.len() + self.sealed.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.sealed);
        out
    }

    /// Splits `salt || sealed` back into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::MalformedPayload`] when the input is too short to
    /// carry a salt and a sealed blob.
    pub fn parse(bytes: &[u8]) -> BoxResult<Self> {
        if bytes.len() < kdf::SALT_LEN + aead::SEAL_OVERHEAD {
            return Err(BoxError::malformed("ciphertext shorter than salt and seal overhead"));
        }
        let (salt_bytes, sealed) = bytes.split_at(kdf::SALT_LEN);
        let mut salt = [0u8; kdf::SALT_LEN];
        salt.copy_from_slice(salt_bytes);
        Ok(Self {
            salt,
            sealed: sealed.to_vec(),
        })
    }
}

/// Encrypts `data` and `metadata` under `password`.
///
/// A fresh salt is generated per call; the master key derived from it seals
/// the payload record and is zeroized before the function returns. Metadata
/// longer than [`METADATA_MAX`] bytes is truncated, not rejected.
///
/// # Errors
///
/// - [`BoxError::EmptyPassword`] when `password` is empty.
/// - [`BoxError::PasswordTooWeak`] when the password's strength class is
///   below `min_strength`.
/// - [`BoxError::KeyDerivation`] when the password hashing primitive is
///   unavailable.
pub fn encrypt(
    data: &[u8],
    metadata: &str,
    password: &str,
    min_strength: PasswordStrength,
) -> BoxResult<Ciphertext> {
    if password.is_empty() {
        return Err(BoxError::EmptyPassword);
    }
    if PasswordStrength::check(password) < min_strength {
        return Err(BoxError::PasswordTooWeak);
    }

    let salt = kdf::generate_salt();
    let master = kdf::derive_master_key(password, &salt)?;

    let payload = CiphertextPayload::new(data.to_vec(), metadata);
    let sealed = aead::seal(master.as_bytes(), &payload.combined())?;

    Ok(Ciphertext { salt, sealed })
}

/// Decrypts an envelope produced by [`encrypt`].
///
/// # Errors
///
/// - [`BoxError::MalformedPayload`] when `bytes` cannot be split into
///   `salt || sealed`, or when the decrypted bytes do not form a valid
///   payload record.
/// - [`BoxError::WrongPasswordOrCorrupt`] when authentication fails; wrong
///   password and corrupted ciphertext are deliberately indistinguishable.
/// - [`BoxError::KeyDerivation`] when the password hashing primitive is
///   unavailable.
pub fn decrypt(bytes: &[u8], password: &str) -> BoxResult<CiphertextPayload> {
    let ciphertext = Ciphertext::parse(bytes)?;

    let master = kdf::derive_master_key(password, &ciphertext.salt)?;
    let plain = aead::open(master.as_bytes(), &ciphertext.sealed)?;

    CiphertextPayload::parse(&plain)
}

/// Truncates `s` to at most `max` bytes without splitting a character.
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
