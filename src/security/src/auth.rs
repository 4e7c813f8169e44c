//! slurmrestd authentication manager
//!
//! One manager per client, its mode fixed at construction:
//!
//! - **local**: trusted Unix socket, no headers at all.
//! - **jwt static**: a pre-issued token, validated up front and sent as is.
//!   Approaching or past expiry is logged but never blocks a request, the
//!   backend's answer decides what happens next.
//! - **jwt auto**: tokens signed locally, generated on first use and renewed
//!   once less than [`RENEWAL_MARGIN_SECONDS`] of validity remain.

use crate::clock::{Clock, SystemClock};
use crate::errors::{SecurityError, SecurityResult};
use crate::jwt::{decode_expiry, IssuedToken, TokenSigner};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use slurmgate_shared::config::{AuthConfig, AuthMode, JwtMode};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Header carrying the Slurm user name
pub const SLURM_USER_NAME_HEADER: &str = "X-SLURM-USER-NAME";
/// Header carrying the Slurm token
pub const SLURM_USER_TOKEN_HEADER: &str = "X-SLURM-USER-TOKEN";

/// Auto tokens are renewed below this remaining validity
pub const RENEWAL_MARGIN_SECONDS: i64 = 60;
/// Static tokens log a warning below this remaining validity
pub const STATIC_EXPIRY_WARNING_SECONDS: i64 = 3600;

/// Header set attached to one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders {
    headers: Vec<(&'static str, String)>,
}

impl AuthHeaders {
    pub fn empty() -> Self {
        Self::default()
    }

    fn user_token(user: &str, token: &str) -> Self {
        Self {
            headers: vec![
                (SLURM_USER_NAME_HEADER, user.to_string()),
                (SLURM_USER_TOKEN_HEADER, token.to_string()),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.headers.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }
}

/// Mode selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Local,
    JwtStatic,
    JwtAuto,
}

#[derive(Debug)]
enum Credential {
    Local,
    Static {
        user: String,
        token: IssuedToken,
    },
    Auto {
        signer: TokenSigner,
        current: Mutex<Option<IssuedToken>>,
    },
}

/// Produces per-request slurmrestd credentials
#[derive(Debug)]
pub struct AuthenticationManager {
    credential: Credential,
    clock: Arc<dyn Clock>,
}

impl AuthenticationManager {
    /// Build a manager from configuration
    ///
    /// `local_transport` tells whether requests travel over the trusted local
    /// socket, which is the only transport local mode is allowed with.
    pub fn from_config(config: &AuthConfig, local_transport: bool) -> SecurityResult<Self> {
        Self::from_config_with_clock(config, local_transport, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(
        config: &AuthConfig,
        local_transport: bool,
        clock: Arc<dyn Clock>,
    ) -> SecurityResult<Self> {
        match (config.mode, config.jwt_mode) {
            (AuthMode::Local, _) => Self::local(local_transport),
            (AuthMode::Jwt, JwtMode::Static) => {
                let token = config.jwt_token.as_deref().ok_or_else(|| {
                    SecurityError::Configuration(
                        "jwt_token is required with static JWT authentication".to_string(),
                    )
                })?;
                Self::jwt_static(&config.jwt_user, token, clock)
            }
            (AuthMode::Jwt, JwtMode::Auto) => {
                let key = config.jwt_key.as_deref().ok_or_else(|| {
                    SecurityError::Configuration(
                        "jwt_key is required with automatic JWT authentication".to_string(),
                    )
                })?;
                let lifespan = i64::try_from(config.jwt_lifespan_seconds)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| {
                        SecurityError::Configuration(format!(
                            "jwt_lifespan_seconds {} is out of range",
                            config.jwt_lifespan_seconds
                        ))
                    })?;
                let signer = TokenSigner::from_key_file(key, &config.jwt_user, lifespan)?;
                Ok(Self::jwt_auto(signer, clock))
            }
        }
    }

    /// Trusted local socket authentication
    pub fn local(local_transport: bool) -> SecurityResult<Self> {
        if !local_transport {
            return Err(SecurityError::Configuration(
                "Local authentication is only valid over the slurmrestd Unix socket".to_string(),
            ));
        }
        Ok(Self {
            credential: Credential::Local,
            clock: Arc::new(SystemClock),
        })
    }

    /// Pre-issued token, rejected right away if unreadable or expired
    pub fn jwt_static(user: &str, token: &str, clock: Arc<dyn Clock>) -> SecurityResult<Self> {
        let expires_at = decode_expiry(token)?;
        let now = clock.now();
        if expires_at <= now {
            return Err(SecurityError::TokenExpired(format!(
                "static JWT expired at {}",
                expires_at.to_rfc3339()
            )));
        }

        info!(
            "Using static JWT for user {} valid until {}",
            user,
            expires_at.to_rfc3339()
        );
        Ok(Self {
            credential: Credential::Static {
                user: user.to_string(),
                token: IssuedToken {
                    token: token.to_string(),
                    expires_at,
                },
            },
            clock,
        })
    }

    /// Locally signed, automatically renewed tokens
    pub fn jwt_auto(signer: TokenSigner, clock: Arc<dyn Clock>) -> Self {
        Self {
            credential: Credential::Auto {
                signer,
                current: Mutex::new(None),
            },
            clock,
        }
    }

    pub fn mode(&self) -> CredentialMode {
        match self.credential {
            Credential::Local => CredentialMode::Local,
            Credential::Static { .. } => CredentialMode::JwtStatic,
            Credential::Auto { .. } => CredentialMode::JwtAuto,
        }
    }

    /// Expiry of the token currently in use, if any
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.credential {
            Credential::Local => None,
            Credential::Static { token, .. } => Some(token.expires_at),
            Credential::Auto { current, .. } => current.lock().as_ref().map(|t| t.expires_at),
        }
    }

    /// Headers to attach to the next request
    pub fn headers(&self) -> SecurityResult<AuthHeaders> {
        match &self.credential {
            Credential::Local => Ok(AuthHeaders::empty()),
            Credential::Static { user, token } => {
                self.check_static_expiry(token);
                Ok(AuthHeaders::user_token(user, &token.token))
            }
            Credential::Auto { signer, current } => {
                // Check and renewal happen under one lock so a half renewed
                // token is never handed out.
                let mut current = current.lock();
                let now = self.clock.now();
                let renew = match current.as_ref() {
                    None => {
                        debug!("No JWT yet, generating first token");
                        true
                    }
                    Some(token) if token.remaining(now) < Duration::seconds(RENEWAL_MARGIN_SECONDS) => {
                        debug!(
                            "JWT expires in {}s, renewing",
                            token.remaining(now).num_seconds()
                        );
                        true
                    }
                    Some(_) => false,
                };

                if renew {
                    let issued = signer.sign(now)?;
                    info!(
                        "Generated JWT for user {} valid until {}",
                        signer.user(),
                        issued.expires_at.to_rfc3339()
                    );
                    *current = Some(issued);
                }

                let token = current.as_ref().ok_or_else(|| {
                    SecurityError::TokenGeneration("no token available after renewal".to_string())
                })?;
                Ok(AuthHeaders::user_token(signer.user(), &token.token))
            }
        }
    }

    fn check_static_expiry(&self, token: &IssuedToken) {
        let remaining = token.remaining(self.clock.now());
        if remaining <= Duration::zero() {
            error!(
                "Static JWT expired at {}, slurmrestd will reject requests",
                token.expires_at.to_rfc3339()
            );
        } else if remaining < Duration::seconds(STATIC_EXPIRY_WARNING_SECONDS) {
            warn!(
                "Static JWT expires in {} seconds, a new token must be configured",
                remaining.num_seconds()
            );
        }
    }
}
