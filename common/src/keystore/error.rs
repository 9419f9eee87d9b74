//! Error types for key-store decoding.
//!
//! Each variant names the offending value and the constraint it broke, so a
//! packaging defect can be diagnosed from the message alone.

use thiserror::Error;

/// Errors raised while decoding a key-store container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyStoreError {
    /// The input ended before a field could be read.
    #[error("key store truncated at byte {offset}: needed {needed} more byte(s)")]
    Truncated {
        /// Offset at which the read was attempted.
        offset: usize,
        /// Bytes required to complete the read.
        needed: usize,
    },

    /// The leading magic number does not identify a JKS container.
    #[error("unrecognised key store magic {found:#010x}; expected {expected:#010x}")]
    BadMagic {
        /// The magic number present in the input.
        found: u32,
        /// The JKS magic number.
        expected: u32,
    },

    /// The container declares a format version this codec cannot read.
    #[error("unsupported key store format version {0}; expected 1 or 2")]
    UnsupportedVersion(u32),

    /// An entry carries a tag other than private key or trusted certificate.
    #[error("entry {index} has unknown tag {tag}")]
    UnknownEntryTag {
        /// Zero-based position of the entry.
        index: u32,
        /// The rejected tag.
        tag: u32,
    },

    /// A string field is not valid UTF-8.
    #[error("entry {index} contains a string that is not valid UTF-8")]
    InvalidString {
        /// Zero-based position of the entry.
        index: u32,
    },

    /// Two entries share the same alias.
    #[error("duplicate alias \"{0}\"")]
    DuplicateAlias(String),

    /// A certificate is not an X.509 certificate.
    #[error("certificate under alias \"{alias}\" has unsupported type \"{cert_type}\"")]
    UnsupportedCertificateType {
        /// Alias of the owning entry.
        alias: String,
        /// The declared certificate type.
        cert_type: String,
    },

    /// The trailing digest does not match; the access token is wrong or the
    /// bytes were altered.
    #[error("key store integrity check failed: wrong access token or tampered data")]
    IntegrityCheckFailed,

    /// Bytes remain after the integrity digest.
    #[error("{0} unexpected byte(s) after the integrity digest")]
    TrailingBytes(usize),

    /// Reading the container stream failed.
    #[error("failed to read key store stream: {0}")]
    Io(String),
}

impl From<std::io::Error> for KeyStoreError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Result type alias using [`KeyStoreError`].
pub type Result<T> = std::result::Result<T, KeyStoreError>;
