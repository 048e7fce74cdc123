//! Error types for the sealed container engine and the envelope codec.

use thiserror::Error;

/// Result type for sealed box operations.
pub type BoxResult<T> = Result<T, BoxError>;

/// Errors raised by the sealed container engine and the envelope codec.
///
/// Authentication failures are deliberately collapsed into the single
/// [`BoxError::WrongPasswordOrCorrupt`] kind: distinguishing a wrong password
/// from tampered ciphertext would hand an attacker a password-guessing
/// oracle.
#[derive(Debug, Error)]
pub enum BoxError {
    /// The password is empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// The password does not reach the strength class required by the caller.
    #[error("password is too weak for the requested operation")]
    PasswordTooWeak,

    /// A file or directory name is not usable inside a container.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// An entry with the same name already exists in the target directory.
    #[error("an entry named {name:?} already exists in the directory")]
    NameAlreadyExists {
        /// The conflicting name.
        name: String,
    },

    /// No file with the given name exists in the target directory.
    #[error("no file named {name:?} in the directory")]
    FileDoesNotExist {
        /// The name that was looked up.
        name: String,
    },

    /// A path component does not resolve to an existing directory.
    #[error("directory does not exist: {path:?}")]
    DirectoryDoesNotExist {
        /// The path that failed to resolve.
        path: String,
    },

    /// The bytes do not form a valid sealed container.
    #[error("invalid container: {context}")]
    InvalidContainer {
        /// What failed to parse or validate.
        context: String,
    },

    /// Decrypted envelope bytes do not form a valid payload record.
    #[error("malformed payload: {context}")]
    MalformedPayload {
        /// What failed to parse.
        context: String,
    },

    /// Authentication failed: wrong password or corrupted ciphertext.
    #[error("decryption failed: wrong password or corrupted data")]
    WrongPasswordOrCorrupt,

    /// The password hashing primitive is unavailable or rejected its
    /// parameters in the current runtime.
    #[error("key derivation failed: {context}")]
    KeyDerivation {
        /// Error reported by the primitive.
        context: String,
    },

    /// A cryptographic operation other than decryption failed.
    #[error("crypto error: {context}")]
    Crypto {
        /// Error reported by the primitive.
        context: String,
    },

    /// The sealed file table of a new container exceeds the reserved region.
    #[error("sealed file table too large: {len} bytes exceeds the reserved table region")]
    TableTooLarge {
        /// Size of the sealed table in bytes.
        len: usize,
    },

    /// A mutation would grow the sealed file table past the reserved region.
    #[error("sealed file table would exceed the reserved table region: {len} bytes")]
    MaxTableSizeExceeded {
        /// Size the sealed table would have had.
        len: usize,
    },

    /// An I/O operation on the container file failed.
    #[error("I/O error during {context}: {source}")]
    Io {
        /// The operation that failed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File table serialization failed.
    #[error("serialization error: {context}")]
    Serialization {
        /// Error reported by the codec.
        context: String,
    },
}

impl BoxError {
    /// Creates an I/O error with context.
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates an invalid container error.
    pub fn invalid_container<S: Into<String>>(context: S) -> Self {
        Self::InvalidContainer {
            context: context.into(),
        }
    }

    /// Creates a malformed payload error.
    pub fn malformed<S: Into<String>>(context: S) -> Self {
        Self::MalformedPayload {
            context: context.into(),
        }
    }

    /// Creates a key derivation error.
    pub fn key_derivation<S: Into<String>>(context: S) -> Self {
        Self::KeyDerivation {
            context: context.into(),
        }
    }

    /// Creates a crypto error.
    pub fn crypto<S: Into<String>>(context: S) -> Self {
        Self::Crypto {
            context: context.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization<S: Into<String>>(context: S) -> Self {
        Self::Serialization {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoxError::DirectoryDoesNotExist {
            path: "a/b".to_string(),
        };
        assert!(format!("{err}").contains("directory does not exist"));

        let err = BoxError::WrongPasswordOrCorrupt;
        let rendered = format!("{err}");
        assert!(rendered.contains("wrong password or corrupted"));
        // The message must not say which of the two it was.
        assert!(!rendered.contains("tag"));

        let err = BoxError::MaxTableSizeExceeded { len: 3_000_000 };
        assert!(format!("{err}").contains("3000000"));
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error as _;

        let err = BoxError::io(
            "reading header",
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"),
        );
        assert!(err.source().is_some());
        assert!(format!("{err}").contains("reading header"));
    }
}
