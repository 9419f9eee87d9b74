//! Semantic version of the running library.
//!
//! [`VERSION`] is embedded at build time from the package manifest. It is
//! parsed once, on first access through [`VersionInfo::get`], into a
//! [`SemanticVersion`] whose numeric parts stay immutable for the rest of the
//! process. The accepted shape is `MAJOR.MINOR.PATCH` with an optional
//! `-SNAPSHOT` suffix marking a development build; anything else is a
//! [`MalformedVersionError`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Current release version.
// Release tooling bumps the package version; nothing else needs editing.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Suffix marking a development build.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

#[expect(
    clippy::expect_used,
    reason = "the pattern is a literal; the unit tests compile it on every run"
)]
static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(-SNAPSHOT)?$").expect("version pattern must compile")
});

static CURRENT: Lazy<SemanticVersion> = Lazy::new(|| match SemanticVersion::parse(VERSION) {
    Ok(version) => version,
    Err(error) => panic!("bundled version literal is unusable: {error}"),
});

/// Raised when a version string is not `MAJOR.MINOR.PATCH[-SNAPSHOT]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed version \"{raw}\": expected MAJOR.MINOR.PATCH with an optional -SNAPSHOT suffix")]
pub struct MalformedVersionError {
    raw: String,
}

impl MalformedVersionError {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
        }
    }

    /// The rejected input.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// A parsed `MAJOR.MINOR.PATCH[-SNAPSHOT]` version.
///
/// Equality, hashing and ordering consider only the numeric parts and the
/// snapshot flag, so `"01.2.3"` and `"1.2.3"` compare equal. A snapshot sorts
/// before the release with the same numbers.
///
/// # Examples
///
/// ```
/// use apiclient::SemanticVersion;
///
/// let version: SemanticVersion = "1.14.2".parse().unwrap();
/// assert_eq!((version.major(), version.minor(), version.patch()), (1, 14, 2));
/// assert!(!version.is_snapshot());
///
/// let snapshot: SemanticVersion = "2.0.0-SNAPSHOT".parse().unwrap();
/// assert!(snapshot.is_snapshot());
/// assert!(snapshot < snapshot.release());
/// ```
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    raw: String,
    major: u64,
    minor: u64,
    patch: u64,
    snapshot: bool,
}

impl SemanticVersion {
    /// Parse `raw`, which must match `^(\d+)\.(\d+)\.(\d+)(-SNAPSHOT)?$`.
    ///
    /// The whole string must match; components that overflow `u64` are
    /// rejected too.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedVersionError`] when `raw` does not match.
    pub fn parse(raw: &str) -> Result<Self, MalformedVersionError> {
        let captures = VERSION_PATTERN
            .captures(raw)
            .ok_or_else(|| MalformedVersionError::new(raw))?;
        let component = |index: usize| {
            captures
                .get(index)
                .and_then(|group| group.as_str().parse::<u64>().ok())
                .ok_or_else(|| MalformedVersionError::new(raw))
        };

        Ok(Self {
            raw: raw.to_owned(),
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
            snapshot: captures.get(4).is_some(),
        })
    }

    /// The string the version was parsed from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Major part of the version.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.major
    }

    /// Minor part of the version.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.minor
    }

    /// Patch (bug fix) part of the version.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.patch
    }

    /// Whether the version carries the `-SNAPSHOT` suffix.
    #[must_use]
    pub const fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    /// The release this version leads up to, without the snapshot suffix.
    #[must_use]
    pub fn release(&self) -> Self {
        Self {
            raw: format!("{}.{}.{}", self.major, self.minor, self.patch),
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            snapshot: false,
        }
    }

    const fn key(&self) -> (u64, u64, u64, bool) {
        // Releases sort after their snapshots.
        (self.major, self.minor, self.patch, !self.snapshot)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl FromStr for SemanticVersion {
    type Err = MalformedVersionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<&str> for SemanticVersion {
    type Error = MalformedVersionError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Access to the process-wide parsed [`VERSION`].
///
/// # Examples
///
/// ```
/// use apiclient::{VERSION, VersionInfo};
///
/// let current = VersionInfo::get();
/// assert_eq!(current.raw(), VERSION);
/// assert_eq!(VersionInfo::major(), current.major());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VersionInfo;

impl VersionInfo {
    /// Parse a version literal. [`get`](Self::get) uses this for
    /// [`VERSION`]; it is public so callers can validate their own literals.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedVersionError`] when `raw` does not match.
    pub fn initialize(raw: &str) -> Result<SemanticVersion, MalformedVersionError> {
        SemanticVersion::parse(raw)
    }

    /// Return the parsed [`VERSION`], parsing it on first access only.
    ///
    /// # Panics
    ///
    /// Panics on first access if [`VERSION`] is malformed. That is a
    /// packaging defect, and the unit tests parse the literal so it never
    /// ships.
    #[must_use]
    pub fn get() -> &'static SemanticVersion {
        &CURRENT
    }

    /// Major part of [`VERSION`].
    ///
    /// # Panics
    ///
    /// See [`get`](Self::get).
    #[must_use]
    pub fn major() -> u64 {
        Self::get().major()
    }

    /// Minor part of [`VERSION`].
    ///
    /// # Panics
    ///
    /// See [`get`](Self::get).
    #[must_use]
    pub fn minor() -> u64 {
        Self::get().minor()
    }

    /// Bug fix part of [`VERSION`].
    ///
    /// # Panics
    ///
    /// See [`get`](Self::get).
    #[must_use]
    pub fn bugfix() -> u64 {
        Self::get().patch()
    }

    /// Whether [`VERSION`] is a development snapshot.
    ///
    /// # Panics
    ///
    /// See [`get`](Self::get).
    #[must_use]
    pub fn is_snapshot() -> bool {
        Self::get().is_snapshot()
    }
}
