//! Shared building blocks for apiclient: the key-store container codec used
//! to read bundled trust stores, and SHA-256 certificate fingerprints.

pub mod fingerprint;
pub mod keystore;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use fingerprint::{Fingerprint, FingerprintError};
pub use keystore::{
    Entry, FormatVersion, JKS_MAGIC, KeyStore, KeyStoreError, PrivateKeyEntry, TrustedCertificate,
};
