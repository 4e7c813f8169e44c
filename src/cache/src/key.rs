//! Cache addressing

use slurmgate_shared::ResourceRequest;
use std::fmt;

/// Key of a cached value and the counter bucket its hits and misses go to
///
/// Parameterized lookups share one bucket (`job-42` and `job-43` both count
/// under `job`) so hit/miss reporting stays bounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    primary: String,
    bucket: String,
}

impl CacheKey {
    /// Key counted under its own name
    pub fn new(primary: impl Into<String>) -> Self {
        let primary = primary.into();
        Self {
            bucket: primary.clone(),
            primary,
        }
    }

    pub fn with_bucket(primary: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            bucket: bucket.into(),
        }
    }

    /// Key of a resource request: `<resource>` or `<resource>-<param>`
    pub fn for_request(request: &ResourceRequest) -> Self {
        let name = request.resource.name();
        match &request.param {
            Some(param) => Self::with_bucket(format!("{}-{}", name, param), name),
            None => Self::new(name),
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.primary == self.bucket {
            f.write_str(&self.primary)
        } else {
            write!(f, "{} ({})", self.primary, self.bucket)
        }
    }
}
