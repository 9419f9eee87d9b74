//! Trust-store settings.
//!
//! `TrustStoreConfig` names the bundled resource to load and the access token
//! that keys its integrity digest. Both default to the store shipped with the
//! crate, so most callers never construct one. Deployments that bundle an
//! alternative store can deserialise overrides from TOML; blank values fall
//! back to the defaults, which keeps templated configuration harmless.

use serde::Deserialize;

use crate::trust_store::{DEFAULT_ACCESS_TOKEN, DEFAULT_RESOURCE};

/// Settings consumed by [`crate::TrustStoreProvider`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrustStoreConfig {
    /// Logical name of the bundled key store.
    pub resource: Option<String>,
    /// Token keying the key store's integrity digest. Not a secret.
    pub access_token: Option<String>,
}

impl TrustStoreConfig {
    /// Parse overrides from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns the TOML parser's error when the document is malformed or
    /// contains unknown fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::TrustStoreConfig;
    ///
    /// let config = TrustStoreConfig::from_toml_str("resource = \"staging.jks\"\n").unwrap();
    /// assert_eq!(config.resource(), "staging.jks");
    /// assert_eq!(config.access_token(), "notasecret");
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load configuration through the supplied loader.
    ///
    /// The loader receives the crate name so that a shared configuration file
    /// can keep the settings under a table of that name. Tests use this to
    /// inject configuration without touching the file system.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::TrustStoreConfig;
    ///
    /// let config = TrustStoreConfig::load_with(|_| TrustStoreConfig::default());
    /// assert_eq!(config.resource(), "api-roots.jks");
    /// ```
    #[must_use]
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnOnce(&str) -> Self,
    {
        loader(env!("CARGO_PKG_NAME"))
    }

    /// Resource name to open, falling back to [`DEFAULT_RESOURCE`].
    #[must_use]
    pub fn resource(&self) -> &str {
        non_blank(self.resource.as_deref()).unwrap_or(DEFAULT_RESOURCE)
    }

    /// Access token to verify with, falling back to [`DEFAULT_ACCESS_TOKEN`].
    #[must_use]
    pub fn access_token(&self) -> &str {
        non_blank(self.access_token.as_deref()).unwrap_or(DEFAULT_ACCESS_TOKEN)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}
