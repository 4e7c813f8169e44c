//! # Slurmgate Cache
//!
//! Cache-aside layer shielding slurmrestd from repeated identical queries.
//!
//! Values are stored as JSON blobs with a TTL. Every lookup is counted as a
//! hit or a miss in a counter bucket, so that parameterized lookups such as
//! `job-42` are reported together under `job`.
//!
//! ```no_run
//! use slurmgate_cache::{CacheKey, CachingService, CacheError};
//! use slurmgate_shared::CacheConfig;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), CacheError> {
//! let service = CachingService::from_config(&CacheConfig::default()).await?;
//! let jobs: Vec<String> = service
//!     .cached(&CacheKey::new("jobs"), Duration::from_secs(10), || async {
//!         Ok::<_, CacheError>(vec!["42".to_string()])
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod key;
pub mod memory;
pub mod redis_store;
pub mod service;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use key::CacheKey;
pub use memory::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use service::CachingService;
pub use store::{CacheMetrics, CacheStore};
