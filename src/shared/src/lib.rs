//! Shared types and configuration for the Slurmgate slurmrestd client

pub mod config;
pub mod types;

pub use config::{
    AuthConfig, AuthMode, CacheConfig, FilterConfig, GatewayConfig, JwtMode, LoggingConfig,
    SlurmrestdConfig,
};

pub use types::*;
