//! Cryptographic primitives shared by the container engine and the envelope
//! codec: password-based key derivation and authenticated encryption.

pub mod aead;
pub mod kdf;

pub use kdf::{derive_master_key, derive_subkey, BoxKey, MasterKey};
