//! Decoder for Java key store (JKS) containers.
//!
//! A JKS container is a big-endian stream: magic, format version, entry
//! count, the entries themselves, then a SHA-1 integrity digest keyed by an
//! access token. Trusted-certificate entries carry a DER certificate;
//! private-key entries carry an opaque protected key plus its certificate
//! chain. Only decoding is supported at runtime; fixtures are produced with
//! [`crate::test_support::KeyStoreWriter`].

mod digest;
pub mod error;
mod reader;

use std::collections::HashSet;
use std::io::Read;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::fingerprint::Fingerprint;
pub use error::KeyStoreError;
use error::Result;
use reader::Reader;

pub(crate) use digest::{DIGEST_LEN, integrity_digest};

/// Magic number opening every JKS container.
pub const JKS_MAGIC: u32 = 0xFEED_FEED;

/// The only certificate type a JKS trust store carries.
pub const X509_CERTIFICATE_TYPE: &str = "X.509";

pub(crate) const TAG_PRIVATE_KEY: u32 = 1;
pub(crate) const TAG_TRUSTED_CERTIFICATE: u32 = 2;

/// On-disk format revision of a JKS container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Version 1 omits the certificate type strings.
    V1,
    /// Version 2 prefixes every certificate with its type.
    V2,
}

impl FormatVersion {
    /// Return the numeric version written in the header.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }
}

impl TryFrom<u32> for FormatVersion {
    type Error = KeyStoreError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(KeyStoreError::UnsupportedVersion(other)),
        }
    }
}

/// A certificate trusted as a root, stored under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedCertificate {
    alias: String,
    created_millis: u64,
    der: Vec<u8>,
}

impl TrustedCertificate {
    /// Build an entry from its parts.
    #[must_use]
    pub fn new(alias: impl Into<String>, created_millis: u64, der: Vec<u8>) -> Self {
        Self {
            alias: alias.into(),
            created_millis,
            der,
        }
    }

    /// Alias the certificate is stored under.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Creation time in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn created_millis(&self) -> u64 {
        self.created_millis
    }

    /// Creation time, or `None` when it does not fit in [`SystemTime`].
    #[must_use]
    pub fn created(&self) -> Option<SystemTime> {
        UNIX_EPOCH.checked_add(Duration::from_millis(self.created_millis))
    }

    /// DER-encoded certificate bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 fingerprint of the DER bytes.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.der)
    }
}

/// A private key with its certificate chain.
///
/// The key stays in its protected (encrypted) form; trust stores never need
/// to recover it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKeyEntry {
    alias: String,
    created_millis: u64,
    protected_key: Vec<u8>,
    chain: Vec<Vec<u8>>,
}

impl PrivateKeyEntry {
    /// Build an entry from its parts.
    #[must_use]
    pub fn new(
        alias: impl Into<String>,
        created_millis: u64,
        protected_key: Vec<u8>,
        chain: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            alias: alias.into(),
            created_millis,
            protected_key,
            chain,
        }
    }

    /// Alias the key is stored under.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Creation time in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn created_millis(&self) -> u64 {
        self.created_millis
    }

    /// The encrypted key blob.
    #[must_use]
    pub fn protected_key(&self) -> &[u8] {
        &self.protected_key
    }

    /// DER certificates of the chain, leaf first.
    #[must_use]
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }
}

/// One entry of a key store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Private key with certificate chain (tag 1).
    PrivateKey(PrivateKeyEntry),
    /// Trusted certificate (tag 2).
    TrustedCertificate(TrustedCertificate),
}

impl Entry {
    /// Alias of the entry.
    #[must_use]
    pub fn alias(&self) -> &str {
        match self {
            Self::PrivateKey(entry) => entry.alias(),
            Self::TrustedCertificate(entry) => entry.alias(),
        }
    }
}

/// A decoded key-store container.
///
/// # Examples
///
/// ```
/// use apiclient_common::KeyStore;
///
/// let store = KeyStore::empty();
/// assert!(store.is_empty());
/// assert_eq!(store.trusted_certificates().count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStore {
    version: FormatVersion,
    entries: Vec<Entry>,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl KeyStore {
    /// Create an empty container, ready to [`load`](Self::load) into.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            version: FormatVersion::V2,
            entries: Vec::new(),
        }
    }

    /// Decode a complete container held in memory.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyStoreError`] when the bytes are structurally invalid or
    /// the integrity digest does not match `access_token`.
    pub fn from_bytes(bytes: &[u8], access_token: &str) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let magic = reader.u32()?;
        if magic != JKS_MAGIC {
            return Err(KeyStoreError::BadMagic {
                found: magic,
                expected: JKS_MAGIC,
            });
        }
        let version = FormatVersion::try_from(reader.u32()?)?;
        let count = reader.u32()?;

        let mut entries = Vec::new();
        let mut aliases = HashSet::new();
        for index in 0..count {
            let entry = read_entry(&mut reader, version, index)?;
            if !aliases.insert(entry.alias().to_owned()) {
                return Err(KeyStoreError::DuplicateAlias(entry.alias().to_owned()));
            }
            entries.push(entry);
        }

        verify_trailer(bytes, reader.offset(), access_token)?;
        debug!(
            "decoded key store: format {}, {} entries",
            version.as_u32(),
            entries.len()
        );
        Ok(Self { version, entries })
    }

    /// Read a container from `stream`, replacing the current contents.
    ///
    /// The container is left untouched when decoding fails.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Io`] when the stream cannot be read, or any
    /// decoding error raised by [`from_bytes`](Self::from_bytes).
    pub fn load<R: Read>(&mut self, mut stream: R, access_token: &str) -> Result<()> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        *self = Self::from_bytes(&bytes, access_token)?;
        Ok(())
    }

    /// Format revision the container was decoded from.
    #[must_use]
    pub const fn version(&self) -> FormatVersion {
        self.version
    }

    /// All entries in container order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries of any kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the container holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by alias.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.alias() == alias)
    }

    /// Iterate over the trusted-certificate entries.
    pub fn trusted_certificates(&self) -> impl Iterator<Item = &TrustedCertificate> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::TrustedCertificate(certificate) => Some(certificate),
            Entry::PrivateKey(_) => None,
        })
    }
}

fn read_entry(reader: &mut Reader<'_>, version: FormatVersion, index: u32) -> Result<Entry> {
    let tag = reader.u32()?;
    if tag != TAG_PRIVATE_KEY && tag != TAG_TRUSTED_CERTIFICATE {
        return Err(KeyStoreError::UnknownEntryTag { index, tag });
    }
    let alias = reader.utf(index)?;
    let created_millis = reader.u64()?;

    if tag == TAG_TRUSTED_CERTIFICATE {
        let der = read_certificate(reader, version, &alias, index)?;
        return Ok(Entry::TrustedCertificate(TrustedCertificate {
            alias,
            created_millis,
            der,
        }));
    }

    let protected_key = reader.blob()?;
    let chain_len = reader.u32()?;
    let mut chain = Vec::new();
    for _ in 0..chain_len {
        chain.push(read_certificate(reader, version, &alias, index)?);
    }
    Ok(Entry::PrivateKey(PrivateKeyEntry {
        alias,
        created_millis,
        protected_key,
        chain,
    }))
}

fn read_certificate(
    reader: &mut Reader<'_>,
    version: FormatVersion,
    alias: &str,
    index: u32,
) -> Result<Vec<u8>> {
    if version == FormatVersion::V2 {
        let cert_type = reader.utf(index)?;
        if cert_type != X509_CERTIFICATE_TYPE {
            return Err(KeyStoreError::UnsupportedCertificateType {
                alias: alias.to_owned(),
                cert_type,
            });
        }
    }
    reader.blob()
}

fn verify_trailer(bytes: &[u8], body_len: usize, access_token: &str) -> Result<()> {
    let (body, trailer) = bytes.split_at(body_len);
    if trailer.len() < DIGEST_LEN {
        return Err(KeyStoreError::Truncated {
            offset: body_len,
            needed: DIGEST_LEN - trailer.len(),
        });
    }
    if trailer.len() > DIGEST_LEN {
        return Err(KeyStoreError::TrailingBytes(trailer.len() - DIGEST_LEN));
    }
    let expected = integrity_digest(access_token, body);
    if !digest::digests_match(&expected, trailer) {
        return Err(KeyStoreError::IntegrityCheckFailed);
    }
    Ok(())
}
