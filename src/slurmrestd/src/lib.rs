//! # Slurmgate Client
//!
//! slurmrestd protocol client for the per-cluster agent.
//!
//! ## Layers
//!
//! - **Base** ([`Slurmrestd`]): negotiates the API version on first use,
//!   sends authenticated requests over the Unix socket or TCP, validates the
//!   responses and adapts payloads of older API versions to the target schema
//! - **Filtered** ([`SlurmrestdFiltered`]): keeps the configured top-level
//!   fields of each resource
//! - **Cached** ([`SlurmrestdCached`]): cache-aside over a shared store with
//!   hit/miss accounting
//!
//! ## Quick Start
//!
//! ```no_run
//! use slurmgate_client::{connect_client, SlurmrestdApi};
//! use slurmgate_shared::GatewayConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env()?;
//! let client = connect_client(&config).await?;
//!
//! let endpoint = client.discover().await?;
//! println!("{}", endpoint);
//! let jobs = client.jobs().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod builder;
pub mod cached;
pub mod client;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod filtered;
pub mod session;
pub mod transport;
pub mod validator;

pub use adapters::{build_chain, Adapter, AdapterChain, AdapterRegistry, IdentityAdapter};
pub use builder::{assemble, build_client, connect_client};
pub use cached::SlurmrestdCached;
pub use client::{Slurmrestd, SlurmrestdApi, INVALID_JOB_ID_ERROR, LIVE_JOB_KEY};
pub use discovery::{Negotiated, VersionDiscovery};
pub use error::{ErrorKind, SlurmrestdError, SlurmrestdResult};
pub use filter::filter_fields;
pub use filtered::SlurmrestdFiltered;
pub use session::{Backend, Session};
pub use transport::{HttpTransport, RawResponse, Transport, UnixTransport};
pub use validator::{validate, AUTHENTICATION_NOT_APPLICABLE};
