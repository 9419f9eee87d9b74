//! Shared test helpers for apiclient crates.
//!
//! [`KeyStoreWriter`] encodes JKS containers so unit and behaviour tests can
//! build stores with exactly the entries, format version, or defects a
//! scenario needs. It is compiled for this crate's own tests and, for other
//! crates, behind the `test-support` feature.

use crate::keystore::{
    FormatVersion, JKS_MAGIC, TAG_PRIVATE_KEY, TAG_TRUSTED_CERTIFICATE, X509_CERTIFICATE_TYPE,
    integrity_digest,
};

/// Creation timestamp written when a test does not care about it.
pub const FIXTURE_CREATED_MILLIS: u64 = 1_700_000_000_000;

#[derive(Clone, Debug)]
enum FixtureEntry {
    Trusted {
        alias: String,
        der: Vec<u8>,
    },
    PrivateKey {
        alias: String,
        protected_key: Vec<u8>,
        chain: Vec<Vec<u8>>,
    },
    Raw {
        tag: u32,
        alias: String,
    },
}

/// Builder that encodes a JKS container.
///
/// # Examples
///
/// ```
/// use apiclient_common::KeyStore;
/// use apiclient_common::test_support::KeyStoreWriter;
///
/// let bytes = KeyStoreWriter::new()
///     .trusted_certificate("root", vec![0x30, 0x00])
///     .encode("notasecret");
/// let store = KeyStore::from_bytes(&bytes, "notasecret").unwrap();
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct KeyStoreWriter {
    version: FormatVersion,
    certificate_type: String,
    entries: Vec<FixtureEntry>,
}

impl Default for KeyStoreWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStoreWriter {
    /// Start an empty version-2 container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: FormatVersion::V2,
            certificate_type: X509_CERTIFICATE_TYPE.to_owned(),
            entries: Vec::new(),
        }
    }

    /// Write the container in the given format revision.
    #[must_use]
    pub fn version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    /// Override the certificate type string written for version 2.
    #[must_use]
    pub fn certificate_type(mut self, certificate_type: &str) -> Self {
        certificate_type.clone_into(&mut self.certificate_type);
        self
    }

    /// Append a trusted-certificate entry.
    #[must_use]
    pub fn trusted_certificate(mut self, alias: &str, der: Vec<u8>) -> Self {
        self.entries.push(FixtureEntry::Trusted {
            alias: alias.to_owned(),
            der,
        });
        self
    }

    /// Append a private-key entry with its chain.
    #[must_use]
    pub fn private_key(mut self, alias: &str, protected_key: Vec<u8>, chain: Vec<Vec<u8>>) -> Self {
        self.entries.push(FixtureEntry::PrivateKey {
            alias: alias.to_owned(),
            protected_key,
            chain,
        });
        self
    }

    /// Append an entry header with an arbitrary tag and no body.
    #[must_use]
    pub fn raw_entry(mut self, tag: u32, alias: &str) -> Self {
        self.entries.push(FixtureEntry::Raw {
            tag,
            alias: alias.to_owned(),
        });
        self
    }

    /// Encode the container and append the digest keyed by `access_token`.
    #[must_use]
    pub fn encode(&self, access_token: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&JKS_MAGIC.to_be_bytes());
        out.extend_from_slice(&self.version.as_u32().to_be_bytes());
        out.extend_from_slice(&len_u32(self.entries.len()).to_be_bytes());

        for entry in &self.entries {
            match entry {
                FixtureEntry::Trusted { alias, der } => {
                    put_header(&mut out, TAG_TRUSTED_CERTIFICATE, alias);
                    self.certificate(&mut out, der);
                }
                FixtureEntry::PrivateKey {
                    alias,
                    protected_key,
                    chain,
                } => {
                    put_header(&mut out, TAG_PRIVATE_KEY, alias);
                    put_blob(&mut out, protected_key);
                    out.extend_from_slice(&len_u32(chain.len()).to_be_bytes());
                    for der in chain {
                        self.certificate(&mut out, der);
                    }
                }
                FixtureEntry::Raw { tag, alias } => put_header(&mut out, *tag, alias),
            }
        }

        let digest = integrity_digest(access_token, &out);
        out.extend_from_slice(&digest);
        out
    }

    fn certificate(&self, out: &mut Vec<u8>, der: &[u8]) {
        if self.version == FormatVersion::V2 {
            put_utf(out, &self.certificate_type);
        }
        put_blob(out, der);
    }
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn put_header(out: &mut Vec<u8>, tag: u32, alias: &str) {
    out.extend_from_slice(&tag.to_be_bytes());
    put_utf(out, alias);
    out.extend_from_slice(&FIXTURE_CREATED_MILLIS.to_be_bytes());
}

fn put_utf(out: &mut Vec<u8>, value: &str) {
    let len = u16::try_from(value.len()).unwrap_or(u16::MAX);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value.as_bytes());
}

fn put_blob(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&len_u32(bytes.len()).to_be_bytes());
    out.extend_from_slice(bytes);
}
