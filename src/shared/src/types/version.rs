//! slurmrestd API version types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building a version list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Supported version list is empty")]
    Empty,

    #[error("Version {0} is listed more than once")]
    Duplicate(String),

    #[error("Version {0} is not in the supported version list")]
    Unsupported(String),
}

/// Ordered list of API versions the client may probe, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SupportedVersions {
    versions: Vec<String>,
}

impl SupportedVersions {
    /// Build a version list from descending (newest first) version strings
    pub fn new<I, S>(versions: I) -> Result<Self, VersionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let versions: Vec<String> = versions.into_iter().map(Into::into).collect();
        if versions.is_empty() {
            return Err(VersionError::Empty);
        }
        for (index, version) in versions.iter().enumerate() {
            if versions[..index].contains(version) {
                return Err(VersionError::Duplicate(version.clone()));
            }
        }
        Ok(Self { versions })
    }

    /// Versions in probe order (newest first)
    pub fn descending(&self) -> &[String] {
        &self.versions
    }

    /// Versions oldest first, the order adapters are chained in
    pub fn ascending(&self) -> Vec<&str> {
        self.versions.iter().rev().map(String::as_str).collect()
    }

    /// Newest supported version
    pub fn latest(&self) -> &str {
        &self.versions[0]
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// Position of a version in the ascending list
    pub fn ascending_index(&self, version: &str) -> Result<usize, VersionError> {
        self.ascending()
            .iter()
            .position(|v| *v == version)
            .ok_or_else(|| VersionError::Unsupported(version.to_string()))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Restrict probing to a single version of this list
    pub fn only(&self, version: &str) -> Result<Self, VersionError> {
        if !self.contains(version) {
            return Err(VersionError::Unsupported(version.to_string()));
        }
        Ok(Self {
            versions: vec![version.to_string()],
        })
    }
}

impl Default for SupportedVersions {
    fn default() -> Self {
        Self {
            versions: vec![
                "0.0.43".to_string(),
                "0.0.42".to_string(),
                "0.0.41".to_string(),
            ],
        }
    }
}

impl TryFrom<Vec<String>> for SupportedVersions {
    type Error = VersionError;

    fn try_from(versions: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(versions)
    }
}

impl From<SupportedVersions> for Vec<String> {
    fn from(versions: SupportedVersions) -> Self {
        versions.versions
    }
}

impl fmt::Display for SupportedVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.versions.join(", "))
    }
}

/// Result of version negotiation with slurmrestd
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEndpoint {
    /// Cluster name reported by slurmctld
    pub cluster: String,
    /// Slurm release string (e.g. 24.05.3)
    pub release: String,
    /// Negotiated API version
    pub api_version: String,
}

impl fmt::Display for DiscoveredEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cluster {} (Slurm {}, API v{})",
            self.cluster, self.release, self.api_version
        )
    }
}
