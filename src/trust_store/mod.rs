//! Process-wide trust store of root certificates for secure connections.
//!
//! The store ships inside the crate as a JKS container (see
//! [`EmbeddedResources`]). [`TrustStoreProvider`] decodes it on first request,
//! turns the trusted certificates into a [`rustls::RootCertStore`] and hands
//! every caller the same [`Arc<TrustStore>`]. [`certificate_trust_store`] is
//! the shared provider most callers want.

mod provider;
mod resource;

use std::sync::Arc;

use apiclient_common::{Entry, Fingerprint, KeyStore, KeyStoreError, TrustedCertificate};
use log::debug;
use rustls::RootCertStore;
use rustls::pki_types::CertificateDer;
use thiserror::Error;

pub use provider::{TrustStoreProvider, certificate_trust_store};
#[cfg(test)]
pub(crate) use resource::MockResourceSource;
pub use resource::{DEFAULT_RESOURCE, EmbeddedResources, ResourceSource};

/// Token keying the bundled store's integrity digest. Not a secret.
pub const DEFAULT_ACCESS_TOKEN: &str = "notasecret";

/// Errors surfaced by [`TrustStoreProvider::get_trust_store`].
///
/// Errors are cloneable so that a failed load can be replayed to every later
/// caller until the provider is reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustStoreError {
    /// The bundled resource could not be opened.
    #[error("trust store resource \"{resource}\" is unavailable: {reason}")]
    ResourceUnavailable {
        /// Logical name of the resource.
        resource: String,
        /// Why opening failed.
        reason: String,
    },

    /// The resource bytes are not a valid key store for the access token.
    #[error("trust store resource \"{resource}\" could not be loaded: {source}")]
    StoreLoad {
        /// Logical name of the resource.
        resource: String,
        /// The decoder's complaint.
        #[source]
        source: KeyStoreError,
    },

    /// A decoded certificate is not usable as a trust anchor.
    #[error("certificate \"{alias}\" in \"{resource}\" is not a usable trust anchor: {reason}")]
    UntrustedCertificate {
        /// Logical name of the resource.
        resource: String,
        /// Alias of the rejected certificate.
        alias: String,
        /// Why the certificate was rejected.
        reason: String,
    },
}

impl TrustStoreError {
    /// Whether the resource itself was missing.
    #[must_use]
    pub const fn is_resource_unavailable(&self) -> bool {
        matches!(self, Self::ResourceUnavailable { .. })
    }

    /// Whether the resource was present but its contents were rejected.
    #[must_use]
    pub const fn is_store_load(&self) -> bool {
        matches!(
            self,
            Self::StoreLoad { .. } | Self::UntrustedCertificate { .. }
        )
    }
}

/// A loaded set of trusted root certificates.
///
/// # Examples
///
/// ```
/// use apiclient::certificate_trust_store;
///
/// let store = certificate_trust_store().unwrap();
/// assert!(!store.is_empty());
/// assert_eq!(store.root_cert_store().len(), store.len());
/// ```
#[derive(Debug, Clone)]
pub struct TrustStore {
    resource: String,
    key_store: KeyStore,
    roots: RootCertStore,
}

impl TrustStore {
    /// Build a trust store from a decoded key store.
    ///
    /// Private-key entries are ignored; every trusted certificate must be
    /// accepted as a trust anchor.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::UntrustedCertificate`] for the first
    /// certificate rustls refuses.
    pub fn from_key_store(resource: &str, key_store: KeyStore) -> Result<Self, TrustStoreError> {
        let mut roots = RootCertStore::empty();
        for entry in key_store.entries() {
            match entry {
                Entry::TrustedCertificate(certificate) => {
                    roots
                        .add(CertificateDer::from(certificate.der()))
                        .map_err(|error| TrustStoreError::UntrustedCertificate {
                            resource: resource.to_owned(),
                            alias: certificate.alias().to_owned(),
                            reason: error.to_string(),
                        })?;
                }
                Entry::PrivateKey(key) => {
                    debug!(
                        "ignoring private key entry \"{}\" in trust store \"{resource}\"",
                        key.alias()
                    );
                }
            }
        }

        Ok(Self {
            resource: resource.to_owned(),
            key_store,
            roots,
        })
    }

    /// Logical name of the resource the store was loaded from.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Number of trusted certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.key_store.trusted_certificates().count()
    }

    /// Whether the store trusts nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aliases of the trusted certificates, in container order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.certificates().map(TrustedCertificate::alias)
    }

    /// Trusted certificates, in container order.
    pub fn certificates(&self) -> impl Iterator<Item = &TrustedCertificate> {
        self.key_store.trusted_certificates()
    }

    /// Look up a trusted certificate by alias.
    #[must_use]
    pub fn certificate(&self, alias: &str) -> Option<&TrustedCertificate> {
        self.certificates().find(|certificate| certificate.alias() == alias)
    }

    /// Whether a certificate with this SHA-256 fingerprint is trusted.
    #[must_use]
    pub fn contains_fingerprint(&self, fingerprint: &Fingerprint) -> bool {
        self.certificates()
            .any(|certificate| certificate.fingerprint() == *fingerprint)
    }

    /// Root store for a rustls client configuration.
    #[must_use]
    pub const fn root_cert_store(&self) -> &RootCertStore {
        &self.roots
    }

    /// The underlying decoded container.
    #[must_use]
    pub const fn key_store(&self) -> &KeyStore {
        &self.key_store
    }
}

impl From<&TrustStore> for Arc<RootCertStore> {
    fn from(store: &TrustStore) -> Self {
        Self::new(store.roots.clone())
    }
}
