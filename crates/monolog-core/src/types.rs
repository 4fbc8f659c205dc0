//! Core types for monolog

use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// Severity of a version bump.
///
/// The variant order is the severity order: `None < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpSeverity {
    /// No release needed
    #[default]
    None,
    /// Patch version bump (bug fixes)
    Patch,
    /// Minor version bump (new features)
    Minor,
    /// Major version bump (breaking changes)
    Major,
}

impl BumpSeverity {
    /// Returns the string representation of the severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }

    /// Whether this severity requires a release
    pub fn is_release(&self) -> bool {
        *self > Self::None
    }

    /// Compute the version that follows `current` under this severity.
    ///
    /// Prerelease and build metadata are cleared on any bump.
    pub fn apply(&self, current: &semver::Version) -> semver::Version {
        let mut next = current.clone();
        match self {
            Self::None => return next,
            Self::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
            Self::Minor => {
                next.minor += 1;
                next.patch = 0;
            }
            Self::Patch => {
                next.patch += 1;
            }
        }
        next.pre = semver::Prerelease::EMPTY;
        next.build = semver::BuildMetadata::EMPTY;
        next
    }
}

impl std::fmt::Display for BumpSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BumpSeverity {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            _ => Err(VersionError::InvalidSeverity(s.to_string())),
        }
    }
}
