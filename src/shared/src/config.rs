//! Configuration structures for the Slurmgate client layer
//!
//! Defaults target a slurmrestd daemon listening on its local Unix socket with
//! trusted local authentication. Values are layered from an optional file
//! named by `SLURMGATE_CONFIG_FILE` and `SLURMGATE_*` environment variables.

use crate::types::SupportedVersions;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default slurmrestd Unix socket
pub const DEFAULT_SLURMRESTD_URI: &str = "unix:///run/slurmrestd/slurmrestd.socket";

/// Top level configuration of one agent's slurmrestd client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Cluster display name, overrides the name reported by slurmrestd
    pub cluster: Option<String>,
    /// slurmrestd connection, versions and authentication
    pub slurmrestd: SlurmrestdConfig,
    /// Response cache
    pub cache: CacheConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

/// slurmrestd connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlurmrestdConfig {
    /// `unix:///path/to/socket` or `http(s)://host:port`
    pub uri: String,
    /// Supported API versions, newest first
    pub versions: SupportedVersions,
    /// Canonical version the rest of the system is written against
    /// (defaults to the newest supported version)
    pub target_version: Option<String>,
    /// Probe only this version instead of the whole list
    pub version_override: Option<String>,
    /// Connect and read timeout in seconds
    pub timeout_seconds: u64,
    /// Authentication
    pub auth: AuthConfig,
    /// Per-resource field allow-lists
    pub filters: FilterConfig,
}

impl Default for SlurmrestdConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_SLURMRESTD_URI.to_string(),
            versions: SupportedVersions::default(),
            target_version: None,
            version_override: None,
            timeout_seconds: 30,
            auth: AuthConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl SlurmrestdConfig {
    pub fn target_version(&self) -> &str {
        self.target_version
            .as_deref()
            .unwrap_or_else(|| self.versions.latest())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn is_unix_socket(&self) -> bool {
        self.uri.starts_with("unix://")
    }
}

/// Authentication mode against slurmrestd
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Trusted local socket, no token
    Local,
    /// JWT sent in slurmrestd user headers
    Jwt,
}

/// How JWT tokens are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JwtMode {
    /// Pre-issued token from configuration
    Static,
    /// Tokens signed locally and renewed before expiry
    Auto,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_mode: JwtMode,
    /// Slurm user name sent with the token
    pub jwt_user: String,
    /// Pre-issued token (static mode)
    pub jwt_token: Option<String>,
    /// Path to the Slurm JWT signing key (auto mode)
    pub jwt_key: Option<PathBuf>,
    /// Lifespan of generated tokens in seconds (auto mode)
    pub jwt_lifespan_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Local,
            jwt_mode: JwtMode::Auto,
            jwt_user: "slurm".to_string(),
            jwt_token: None,
            jwt_key: None,
            jwt_lifespan_seconds: 3600,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Redis connection URL
    pub redis_url: String,
    /// Connection timeout in seconds
    pub connect_timeout_seconds: u64,
    /// Prefix of every key written to the store
    pub key_prefix: String,
    /// TTL applied to resources without an explicit entry
    pub default_ttl_seconds: u64,
    /// TTL per resource name (`jobs`, `job`, `nodes`, ...)
    pub ttl: HashMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let ttl = [
            ("diag", 30),
            ("jobs", 10),
            ("job", 10),
            ("acct-job", 60),
            ("nodes", 30),
            ("node", 10),
            ("partitions", 60),
            ("reservations", 60),
            ("qos", 60),
            ("accounts", 60),
            ("users", 60),
            ("associations", 60),
        ]
        .into_iter()
        .map(|(name, seconds)| (name.to_string(), seconds))
        .collect();

        Self {
            enabled: false,
            redis_url: "redis://localhost:6379".to_string(),
            connect_timeout_seconds: 5,
            key_prefix: "slurmgate".to_string(),
            default_ttl_seconds: 60,
            ttl,
        }
    }
}

impl CacheConfig {
    /// TTL for a resource name, falling back to the default TTL
    pub fn ttl_for(&self, resource: &str) -> Duration {
        Duration::from_secs(
            self.ttl
                .get(resource)
                .copied()
                .unwrap_or(self.default_ttl_seconds),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Per-resource allow-lists of top-level keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub resources: HashMap<String, Vec<String>>,
}

impl FilterConfig {
    /// Allow-list for a resource, `None` means no filtering
    pub fn allow_list(&self, resource: &str) -> Option<&[String]> {
        self.resources.get(resource).map(Vec::as_slice)
    }

    pub fn with_resource<I, S>(mut self, resource: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.insert(
            resource.to_string(),
            fields.into_iter().map(Into::into).collect(),
        );
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from an optional file and environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = config::Config::builder()
            .set_default("slurmrestd.uri", DEFAULT_SLURMRESTD_URI)?
            .set_default("slurmrestd.timeout_seconds", 30)?
            .set_default("slurmrestd.auth.mode", "local")?
            .set_default("slurmrestd.auth.jwt_mode", "auto")?
            .set_default("slurmrestd.auth.jwt_user", "slurm")?
            .set_default("slurmrestd.auth.jwt_lifespan_seconds", 3600)?
            .set_default("cache.enabled", false)?
            .set_default("cache.redis_url", "redis://localhost:6379")?
            .set_default("cache.key_prefix", "slurmgate")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        if let Ok(config_path) = std::env::var("SLURMGATE_CONFIG_FILE") {
            cfg = cfg.add_source(config::File::with_name(&config_path).required(false));
        }

        cfg = cfg.add_source(
            config::Environment::with_prefix("SLURMGATE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("slurmrestd.versions")
                .try_parsing(true),
        );

        let config: Self = cfg.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, without environment overrides
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let slurmrestd = &self.slurmrestd;

        if !(slurmrestd.uri.starts_with("unix://")
            || slurmrestd.uri.starts_with("http://")
            || slurmrestd.uri.starts_with("https://"))
        {
            return Err(ConfigError::Message(format!(
                "Unsupported slurmrestd URI scheme: {}",
                slurmrestd.uri
            )));
        }

        if slurmrestd.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "slurmrestd timeout must be greater than 0".to_string(),
            ));
        }

        if !slurmrestd.versions.contains(slurmrestd.target_version()) {
            return Err(ConfigError::Message(format!(
                "Target version {} is not in supported versions [{}]",
                slurmrestd.target_version(),
                slurmrestd.versions
            )));
        }

        if let Some(version) = &slurmrestd.version_override {
            if !slurmrestd.versions.contains(version) {
                return Err(ConfigError::Message(format!(
                    "Version override {} is not in supported versions [{}]",
                    version, slurmrestd.versions
                )));
            }
        }

        let auth = &slurmrestd.auth;
        match auth.mode {
            AuthMode::Local if !slurmrestd.is_unix_socket() => {
                return Err(ConfigError::Message(
                    "Local authentication requires a slurmrestd Unix socket".to_string(),
                ));
            }
            AuthMode::Jwt => match auth.jwt_mode {
                JwtMode::Static if auth.jwt_token.is_none() => {
                    return Err(ConfigError::Message(
                        "jwt_token is required with static JWT authentication".to_string(),
                    ));
                }
                JwtMode::Auto if auth.jwt_key.is_none() => {
                    return Err(ConfigError::Message(
                        "jwt_key is required with automatic JWT authentication".to_string(),
                    ));
                }
                JwtMode::Auto if auth.jwt_lifespan_seconds == 0 => {
                    return Err(ConfigError::Message(
                        "jwt_lifespan_seconds must be greater than 0".to_string(),
                    ));
                }
                _ => {}
            },
            _ => {}
        }

        if self.cache.enabled && self.cache.redis_url.is_empty() {
            return Err(ConfigError::Message(
                "redis_url is required when the cache is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
