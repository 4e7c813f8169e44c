//! Shared type definitions for the Slurmgate client layer
//!
//! Version negotiation types and resource addressing used by the security,
//! cache and slurmrestd crates.

pub mod resource;
pub mod version;

pub use resource::{Component, Resource, ResourceQuery, ResourceRequest};
pub use version::{DiscoveredEndpoint, SupportedVersions, VersionError};
