//! SHA-256 certificate fingerprint newtype.
//!
//! Fingerprints are stored as 64 lowercase hexadecimal characters. The
//! [`Fingerprint::colon_separated`] rendering matches what `keytool -list`
//! prints, which makes it easy to compare against an operator's notes.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Write as _;
use thiserror::Error;

/// Expected length of a hex-encoded SHA-256 fingerprint.
const FINGERPRINT_HEX_LEN: usize = 64;

/// Errors raised when a fingerprint string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    /// The value is not a 64-character lowercase hex string.
    #[error("invalid SHA-256 fingerprint \"{value}\": {reason}")]
    Invalid {
        /// The rejected input.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },
}

/// A validated hex-encoded SHA-256 certificate fingerprint.
///
/// # Examples
///
/// ```
/// use apiclient_common::Fingerprint;
///
/// let fingerprint = Fingerprint::of(b"certificate bytes");
/// assert_eq!(fingerprint.as_str().len(), 64);
///
/// let parsed = Fingerprint::try_from(fingerprint.as_str()).unwrap();
/// assert_eq!(parsed, fingerprint);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a DER-encoded certificate.
    #[must_use]
    pub fn of(der: &[u8]) -> Self {
        let digest = Sha256::digest(der);
        let mut hex = String::with_capacity(FINGERPRINT_HEX_LEN);
        for byte in digest {
            // Writing to a String cannot fail.
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Return the fingerprint as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render as uppercase byte pairs joined by colons, e.g. `D9:47:…`.
    #[must_use]
    pub fn colon_separated(&self) -> String {
        let upper = self.0.to_ascii_uppercase();
        let pairs: Vec<&str> = upper
            .as_bytes()
            .chunks(2)
            .filter_map(|pair| std::str::from_utf8(pair).ok())
            .collect();
        pairs.join(":")
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_fingerprint(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_fingerprint(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_fingerprint(value: &str) -> Result<(), FingerprintError> {
    let invalid = |reason: String| FingerprintError::Invalid {
        value: value.to_owned(),
        reason,
    };

    if value.len() != FINGERPRINT_HEX_LEN {
        return Err(invalid(format!(
            "expected {FINGERPRINT_HEX_LEN} hex characters, got {}",
            value.len()
        )));
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(invalid(format!("non-hex character '{bad}'")));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("fingerprint must be lowercase".to_owned()));
    }
    Ok(())
}
