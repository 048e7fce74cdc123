//! Master key and subkey derivation.
//!
//! The master key is derived from `(password, salt)` with Argon2id at fixed
//! moderate cost. Subkeys are derived from the master key with HKDF-SHA256
//! under a small integer index plus a context label, so that the table key
//! and the content key are independent: compromise of one subkey's use does
//! not reveal the other's.
//!
//! Nothing above this module may touch the password directly.

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{BoxError, BoxResult};

/// Length of a derived key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the per-container password salt in bytes.
pub const SALT_LEN: usize = 16;

/// Argon2id memory cost in KiB (64 MiB).
const ARGON2_MEMORY_KIB: u32 = 64 * 1024;

/// Argon2id iteration count.
const ARGON2_ITERATIONS: u32 = 3;

/// Argon2id lane count.
const ARGON2_LANES: u32 = 1;

/// Root secret derived from a password and salt.
///
/// Exists only transiently while subkeys are derived; never persisted, never
/// logged. The buffer is zeroized on drop, including on early-return error
/// paths, so dropping the value is the scoped release the format requires.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Returns a reference to the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Symmetric subkey owned by an open container or a single envelope
/// operation.
///
/// Zeroized on drop; never logged or serialized.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BoxKey([u8; KEY_LEN]);

impl BoxKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for BoxKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxKey").field("key", &"[REDACTED]").finish()
    }
}

/// Generates a fresh random password salt.
///
/// One salt per container, stored unencrypted in the header, never reused.
#[must_use]
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derives the master key from a password and salt with Argon2id.
///
/// Cost parameters are fixed (64 MiB memory, 3 iterations, 1 lane); the same
/// `(password, salt)` pair always yields the same key, which is what makes a
/// container re-openable.
///
/// # Errors
///
/// Returns [`BoxError::KeyDerivation`] when the password hashing primitive
/// rejects its parameters or is otherwise unavailable in the current
/// runtime.
pub fn derive_master_key(password: &str, salt: &[u8; SALT_LEN]) -> BoxResult<MasterKey> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_LANES,
        Some(KEY_LEN),
    )
    .map_err(|err| BoxError::key_derivation(err.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut out)
        .map_err(|err| BoxError::key_derivation(err.to_string()))?;

    Ok(MasterKey(out))
}

/// Derives an independent subkey from the master key.
///
/// `(index, context)` pairs form a fixed, versioned enumeration; distinct
/// pairs never collide in practice. Deterministic and pure.
///
/// # Panics
///
/// This function will not panic: a 32-byte PRK and a 32-byte output length
/// are always valid for HKDF-SHA256.
#[must_use]
pub fn derive_subkey(master: &MasterKey, index: u64, context: &str) -> BoxKey {
    let hk = Hkdf::<Sha256>::from_prk(master.as_bytes()).expect("32-byte PRK is always valid");

    let mut info = Vec::with_capacity(context.len() + 8);
    info.extend_from_slice(context.as_bytes());
    info.extend_from_slice(&index.to_le_bytes());

    let mut out = [0u8; KEY_LEN];
    hk.expand(&info, &mut out)
        .expect("32 bytes is a valid HKDF-SHA256 output length");

    BoxKey(out)
}
