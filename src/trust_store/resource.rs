//! Bundled resources and the seam the provider reads them through.

use std::io::{self, Read};

/// Logical name of the trust store shipped with the crate.
pub const DEFAULT_RESOURCE: &str = "api-roots.jks";

/// Resources compiled into the binary, by logical name.
const BUNDLED: &[(&str, &[u8])] = &[(
    DEFAULT_RESOURCE,
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/api-roots.jks")),
)];

/// Source of named resource streams.
///
/// The provider only ever opens resources through this trait, so tests can
/// count, fail, or substitute loads without touching the bundled bytes.
#[cfg_attr(test, mockall::automock)]
pub trait ResourceSource {
    /// Open the resource called `name`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when no such resource exists or it cannot be
    /// opened.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>>;
}

/// Resources embedded at build time with `include_bytes!`.
///
/// # Examples
///
/// ```
/// use apiclient::{DEFAULT_RESOURCE, EmbeddedResources, ResourceSource};
///
/// assert!(EmbeddedResources.open(DEFAULT_RESOURCE).is_ok());
/// assert!(EmbeddedResources.open("missing.jks").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddedResources;

impl EmbeddedResources {
    /// Logical names of every bundled resource.
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(name, _)| *name)
    }

    /// Raw bytes of a bundled resource.
    #[must_use]
    pub fn bytes(name: &str) -> Option<&'static [u8]> {
        BUNDLED
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, bytes)| *bytes)
    }
}

impl ResourceSource for EmbeddedResources {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        Self::bytes(name)
            .map(|bytes| Box::new(bytes) as Box<dyn Read>)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no bundled resource named \"{name}\""),
                )
            })
    }
}
