//! Release version metadata and a cached root-certificate trust store for
//! API clients.
//!
//! [`version`] parses the crate's own semantic version once and exposes the
//! numeric parts. [`trust_store`] loads the bundled key store of trusted root
//! certificates on first use and shares the result with every later caller.

pub mod config;
pub mod trust_store;
pub mod version;

pub use config::TrustStoreConfig;
pub use trust_store::{
    DEFAULT_ACCESS_TOKEN, DEFAULT_RESOURCE, EmbeddedResources, ResourceSource, TrustStore,
    TrustStoreError, TrustStoreProvider, certificate_trust_store,
};
pub use version::{MalformedVersionError, SemanticVersion, VERSION, VersionInfo};
