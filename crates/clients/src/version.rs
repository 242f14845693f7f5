//! Server version gating.

use semver::Version;

use crate::error::{Error, Result};

/// Something that can answer "is the server at least this version?".
pub trait MinVersionEnforceable {
    /// True when the server is at `min` or newer.
    fn enforce_min_version(&self, min: &Version) -> bool;
}

/// A version reported by Elasticsearch or Kibana.
///
/// Comparison ignores pre-release and build metadata, so a
/// `8.16.0-SNAPSHOT` server satisfies a `8.16.0` requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion(Version);

impl ServerVersion {
    /// Wraps a parsed version.
    #[must_use]
    pub const fn new(version: Version) -> Self {
        Self(version)
    }

    /// Parses a version number as reported by the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the string is not semver.
    pub fn parse(raw: &str) -> Result<Self> {
        Version::parse(raw.trim())
            .map(Self)
            .map_err(|source| Error::InvalidVersion {
                version: raw.to_string(),
                source,
            })
    }

    /// The underlying version.
    #[must_use]
    pub const fn version(&self) -> &Version {
        &self.0
    }
}

impl MinVersionEnforceable for ServerVersion {
    fn enforce_min_version(&self, min: &Version) -> bool {
        (self.0.major, self.0.minor, self.0.patch) >= (min.major, min.minor, min.patch)
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforce_min_version() {
        let min = Version::new(8, 16, 0);
        assert!(ServerVersion::parse("8.16.0").unwrap().enforce_min_version(&min));
        assert!(ServerVersion::parse("9.0.1").unwrap().enforce_min_version(&min));
        assert!(!ServerVersion::parse("8.15.3").unwrap().enforce_min_version(&min));
    }

    #[test]
    fn test_snapshot_satisfies_release() {
        let min = Version::new(8, 16, 0);
        assert!(ServerVersion::parse("8.16.0-SNAPSHOT").unwrap().enforce_min_version(&min));
    }

    #[test]
    fn test_invalid_version() {
        assert!(matches!(
            ServerVersion::parse("eight"),
            Err(Error::InvalidVersion { .. })
        ));
    }
}
