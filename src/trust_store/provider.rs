//! Lazily loaded, shared trust store.
//!
//! The cache is a `RwLock` around the outcome of the single load. Readers
//! take the read lock only. The first caller to find the slot empty takes the
//! write lock, checks again, loads, and stores the outcome before releasing
//! it, so concurrent first callers block until that load finishes and never
//! see a partial result. Failures are cached as well: a missing or corrupt
//! resource keeps failing until [`TrustStoreProvider::reset`] is called.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use apiclient_common::KeyStore;
use log::{debug, info, warn};

use super::resource::{EmbeddedResources, ResourceSource};
use super::{TrustStore, TrustStoreError};
use crate::config::TrustStoreConfig;

type Outcome = Result<Arc<TrustStore>, TrustStoreError>;

static SHARED: TrustStoreProvider = TrustStoreProvider::new(
    EmbeddedResources,
    TrustStoreConfig {
        resource: None,
        access_token: None,
    },
);

/// Return the process-wide trust store loaded from the bundled resource.
///
/// The first call loads the store; every later call returns the same handle.
///
/// # Errors
///
/// Returns [`TrustStoreError`] when the bundled store is missing or invalid.
/// The failure is cached, so every call reports it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use apiclient::certificate_trust_store;
///
/// let first = certificate_trust_store().unwrap();
/// let second = certificate_trust_store().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub fn certificate_trust_store() -> Result<Arc<TrustStore>, TrustStoreError> {
    SHARED.get_trust_store()
}

/// Loads a trust store once and shares it with every caller.
#[derive(Debug)]
pub struct TrustStoreProvider<S = EmbeddedResources> {
    source: S,
    config: TrustStoreConfig,
    cache: RwLock<Option<Outcome>>,
    loads: AtomicUsize,
}

impl TrustStoreProvider<EmbeddedResources> {
    /// Provider for the bundled store with default settings.
    #[must_use]
    pub fn embedded() -> Self {
        Self::new(EmbeddedResources, TrustStoreConfig::default())
    }
}

impl<S: ResourceSource> TrustStoreProvider<S> {
    /// Create a provider that opens resources through `source`.
    ///
    /// Nothing is loaded until the first [`get_trust_store`](Self::get_trust_store).
    #[must_use]
    pub const fn new(source: S, config: TrustStoreConfig) -> Self {
        Self {
            source,
            config,
            cache: RwLock::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the trust store, loading it on the first call.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::ResourceUnavailable`] when the resource
    /// cannot be opened, and [`TrustStoreError::StoreLoad`] or
    /// [`TrustStoreError::UntrustedCertificate`] when its contents are
    /// rejected. The outcome of the first load is returned until
    /// [`reset`](Self::reset).
    pub fn get_trust_store(&self) -> Result<Arc<TrustStore>, TrustStoreError> {
        if let Some(cached) = self.cached() {
            return cached.inspect_err(|error| {
                debug!("replaying cached trust store failure: {error}");
            });
        }

        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have loaded while this one waited for the lock.
        if let Some(cached) = slot.as_ref() {
            return cached.clone();
        }
        let outcome = self.load().map(Arc::new);
        *slot = Some(outcome.clone());
        outcome
    }

    /// Drop the cached outcome so the next request loads again.
    ///
    /// Handles already returned stay valid.
    pub fn reset(&self) {
        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            debug!(
                "cleared cached trust store \"{}\"",
                self.config.resource()
            );
        }
    }

    /// Whether a successfully loaded store is cached.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.cached(), Some(Ok(_)))
    }

    /// Number of load attempts made so far, successful or not.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Settings the provider loads with.
    #[must_use]
    pub const fn config(&self) -> &TrustStoreConfig {
        &self.config
    }

    fn cached(&self) -> Option<Outcome> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn load(&self) -> Result<TrustStore, TrustStoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let resource = self.config.resource();
        debug!("loading trust store from bundled resource \"{resource}\"");

        let stream =
            self.source
                .open(resource)
                .map_err(|error| TrustStoreError::ResourceUnavailable {
                    resource: resource.to_owned(),
                    reason: error.to_string(),
                });

        let outcome = stream.and_then(|reader| {
            let mut key_store = KeyStore::empty();
            key_store
                .load(reader, self.config.access_token())
                .map_err(|source| TrustStoreError::StoreLoad {
                    resource: resource.to_owned(),
                    source,
                })?;
            TrustStore::from_key_store(resource, key_store)
        });

        match &outcome {
            Ok(store) => info!(
                "loaded trust store \"{resource}\" with {} trusted certificate(s)",
                store.len()
            ),
            Err(error) => warn!("failed to load trust store: {error}"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust_store::MockResourceSource;
    use crate::trust_store::resource::DEFAULT_RESOURCE;
    use apiclient_common::KeyStoreError;
    use apiclient_common::test_support::KeyStoreWriter;
    use mockall::Sequence;
    use rstest::{fixture, rstest};
    use std::io::{self, Read};

    fn bundled_bytes() -> &'static [u8] {
        EmbeddedResources::bytes(DEFAULT_RESOURCE).expect("bundled store present")
    }

    fn serve(bytes: Vec<u8>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(io::Cursor::new(bytes)))
    }

    fn not_found(name: &str) -> io::Result<Box<dyn Read>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{name} is not bundled"),
        ))
    }

    #[fixture]
    fn config() -> TrustStoreConfig {
        TrustStoreConfig::default()
    }

    #[rstest]
    fn loads_once_and_returns_the_same_handle(config: TrustStoreConfig) {
        let mut source = MockResourceSource::new();
        source
            .expect_open()
            .withf(|name| name == DEFAULT_RESOURCE)
            .times(1)
            .returning(|_| serve(bundled_bytes().to_vec()));
        let provider = TrustStoreProvider::new(source, config);

        let first = provider.get_trust_store().expect("bundled store loads");
        for _ in 0..5 {
            let again = provider.get_trust_store().expect("cached store");
            assert!(Arc::ptr_eq(&first, &again));
        }

        assert_eq!(first.len(), 6);
        assert_eq!(provider.load_count(), 1);
        assert!(provider.is_loaded());
    }

    #[rstest]
    fn nothing_loads_before_the_first_request(config: TrustStoreConfig) {
        let mut source = MockResourceSource::new();
        source.expect_open().never();
        let provider = TrustStoreProvider::new(source, config);

        assert!(!provider.is_loaded());
        assert_eq!(provider.load_count(), 0);
    }

    #[rstest]
    fn missing_resources_fail_on_every_call(config: TrustStoreConfig) {
        let mut source = MockResourceSource::new();
        source.expect_open().times(1).returning(not_found);
        let provider = TrustStoreProvider::new(source, config);

        for _ in 0..3 {
            let error = provider.get_trust_store().expect_err("resource is missing");
            assert!(error.is_resource_unavailable(), "unexpected error: {error}");
        }
        assert_eq!(provider.load_count(), 1);
        assert!(!provider.is_loaded());
    }

    #[rstest]
    fn reset_allows_a_later_load_to_succeed(config: TrustStoreConfig) {
        let mut sequence = Sequence::new();
        let mut source = MockResourceSource::new();
        source
            .expect_open()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(not_found);
        source
            .expect_open()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| serve(bundled_bytes().to_vec()));
        let provider = TrustStoreProvider::new(source, config);

        assert!(provider.get_trust_store().is_err());
        assert!(provider.get_trust_store().is_err());
        provider.reset();
        let store = provider.get_trust_store().expect("second load succeeds");

        assert!(!store.is_empty());
        assert_eq!(provider.load_count(), 2);
    }

    #[rstest]
    fn reset_keeps_handed_out_handles_valid(config: TrustStoreConfig) {
        let mut source = MockResourceSource::new();
        source
            .expect_open()
            .times(2)
            .returning(|_| serve(bundled_bytes().to_vec()));
        let provider = TrustStoreProvider::new(source, config);

        let before = provider.get_trust_store().expect("first load");
        provider.reset();
        let after = provider.get_trust_store().expect("second load");

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.len(), after.len());
    }

    #[rstest]
    fn corrupt_bytes_are_a_store_load_error(config: TrustStoreConfig) {
        let mut source = MockResourceSource::new();
        source.expect_open().times(1).returning(|_| {
            let mut bytes = bundled_bytes().to_vec();
            if let Some(byte) = bytes.get_mut(100) {
                *byte ^= 0xFF;
            }
            serve(bytes)
        });
        let provider = TrustStoreProvider::new(source, config);

        let error = provider.get_trust_store().expect_err("corrupt store");
        assert!(error.is_store_load());
    }

    #[rstest]
    fn wrong_token_is_a_store_load_error() {
        let mut source = MockResourceSource::new();
        source
            .expect_open()
            .returning(|_| serve(bundled_bytes().to_vec()));
        let config = TrustStoreConfig {
            resource: None,
            access_token: Some("changeit".to_owned()),
        };
        let provider = TrustStoreProvider::new(source, config);

        assert_eq!(
            provider.get_trust_store().expect_err("wrong token"),
            TrustStoreError::StoreLoad {
                resource: DEFAULT_RESOURCE.to_owned(),
                source: KeyStoreError::IntegrityCheckFailed,
            }
        );
    }

    #[rstest]
    fn opens_the_configured_resource() {
        let mut source = MockResourceSource::new();
        source
            .expect_open()
            .withf(|name| name == "staging.jks")
            .times(1)
            .returning(not_found);
        let config = TrustStoreConfig {
            resource: Some("staging.jks".to_owned()),
            access_token: None,
        };
        let provider = TrustStoreProvider::new(source, config);

        let error = provider.get_trust_store().expect_err("not bundled");
        assert!(error.to_string().contains("staging.jks"));
    }

    #[rstest]
    fn rejects_certificates_rustls_cannot_anchor(config: TrustStoreConfig) {
        let bytes = KeyStoreWriter::new()
            .trusted_certificate("garbage", vec![0x30, 0x00])
            .encode(config.access_token());
        let mut source = MockResourceSource::new();
        source
            .expect_open()
            .returning(move |_| serve(bytes.clone()));
        let provider = TrustStoreProvider::new(source, config);

        let error = provider.get_trust_store().expect_err("unusable anchor");
        assert!(matches!(
            &error,
            TrustStoreError::UntrustedCertificate { alias, .. } if alias == "garbage"
        ));
        assert!(error.is_store_load());
    }

    #[rstest]
    fn private_keys_are_not_trusted(config: TrustStoreConfig) {
        let bundled = KeyStore::from_bytes(bundled_bytes(), config.access_token())
            .expect("bundled store decodes");
        let root = bundled
            .trusted_certificates()
            .next()
            .expect("at least one root")
            .der()
            .to_vec();
        let bytes = KeyStoreWriter::new()
            .private_key("client", vec![1, 2, 3], vec![root.clone()])
            .trusted_certificate("root", root)
            .encode(config.access_token());
        let mut source = MockResourceSource::new();
        source
            .expect_open()
            .returning(move |_| serve(bytes.clone()));
        let provider = TrustStoreProvider::new(source, config);

        let store = provider.get_trust_store().expect("store loads");
        assert_eq!(store.aliases().collect::<Vec<_>>(), ["root"]);
        assert_eq!(store.root_cert_store().len(), 1);
        assert_eq!(store.key_store().len(), 2);
    }

    #[rstest]
    fn shared_provider_serves_the_bundled_store() {
        let first = certificate_trust_store().expect("bundled store loads");
        let second = certificate_trust_store().expect("cached store");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.resource(), DEFAULT_RESOURCE);
    }
}
