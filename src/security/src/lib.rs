//! # Slurmgate Security
//!
//! Credentials for requests sent to slurmrestd.
//!
//! ## Features
//!
//! - **Local authentication**: no token over the trusted Unix socket
//! - **Static JWT**: pre-issued token, validated at startup, expiry monitored
//! - **Automatic JWT**: tokens signed with the Slurm key and renewed before expiry
//!
//! ## Quick Start
//!
//! ```no_run
//! use slurmgate_security::AuthenticationManager;
//! use slurmgate_shared::AuthConfig;
//!
//! let manager = AuthenticationManager::from_config(&AuthConfig::default(), true)?;
//! for (name, value) in manager.headers()?.iter() {
//!     println!("{}: {}", name, value);
//! }
//! # Ok::<(), slurmgate_security::SecurityError>(())
//! ```

pub mod auth;
pub mod clock;
pub mod errors;
pub mod jwt;

pub use auth::{
    AuthHeaders, AuthenticationManager, CredentialMode, SLURM_USER_NAME_HEADER,
    SLURM_USER_TOKEN_HEADER,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{SecurityError, SecurityResult};
pub use jwt::{decode_expiry, IssuedToken, SlurmJwtClaims, TokenSigner};
