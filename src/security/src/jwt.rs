//! Slurm JWT tokens
//!
//! slurmrestd accepts HS256 tokens signed with the cluster's `jwt_hs256.key`.
//! The only claims Slurm looks at are the expiry, the issue time and the
//! Slurm user name (`sun`).

use crate::errors::{SecurityError, SecurityResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Claims understood by Slurm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlurmJwtClaims {
    /// Expiration time (UTC timestamp)
    pub exp: i64,
    /// Issued at (UTC timestamp)
    pub iat: i64,
    /// Slurm user name
    pub sun: String,
}

/// Only the expiry is needed to track a pre-issued token
#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// A signed token and the instant it stops being accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Validity left at `now`, negative once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}

/// Signs Slurm tokens with a locally held key
pub struct TokenSigner {
    encoding_key: EncodingKey,
    user: String,
    lifespan: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("user", &self.user)
            .field("lifespan", &self.lifespan)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(key: &[u8], user: impl Into<String>, lifespan: Duration) -> SecurityResult<Self> {
        if key.is_empty() {
            return Err(SecurityError::Configuration(
                "JWT signing key is empty".to_string(),
            ));
        }
        if lifespan <= Duration::zero() {
            return Err(SecurityError::Configuration(
                "JWT lifespan must be greater than 0".to_string(),
            ));
        }
        if Utc::now().checked_add_signed(lifespan).is_none() {
            return Err(SecurityError::Configuration(format!(
                "JWT lifespan of {}s is out of range",
                lifespan.num_seconds()
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(key),
            user: user.into(),
            lifespan,
        })
    }

    /// Load the signing key from the Slurm key file
    pub fn from_key_file(
        path: &Path,
        user: impl Into<String>,
        lifespan: Duration,
    ) -> SecurityResult<Self> {
        let key = std::fs::read(path).map_err(|e| SecurityError::KeyFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("Loaded JWT signing key from {}", path.display());
        Self::new(&key, user, lifespan)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn lifespan(&self) -> Duration {
        self.lifespan
    }

    /// Create claims for a token issued at `now`
    pub fn create_claims(&self, now: DateTime<Utc>) -> SecurityResult<SlurmJwtClaims> {
        let expires_at = now.checked_add_signed(self.lifespan).ok_or_else(|| {
            SecurityError::TokenGeneration(format!(
                "expiry of a token issued at {} is out of range",
                now.to_rfc3339()
            ))
        })?;

        Ok(SlurmJwtClaims {
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            sun: self.user.clone(),
        })
    }

    /// Sign a fresh token issued at `now`
    pub fn sign(&self, now: DateTime<Utc>) -> SecurityResult<IssuedToken> {
        let claims = self.create_claims(now)?;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SecurityError::TokenGeneration(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: timestamp_to_datetime(claims.exp)?,
        })
    }
}

/// Read the expiry of a token without verifying its signature
///
/// The signing key of a pre-issued token is not available to the client, only
/// slurmrestd can verify it.
pub fn decode_expiry(token: &str) -> SecurityResult<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let data = decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)?;
    timestamp_to_datetime(data.claims.exp)
}

fn timestamp_to_datetime(timestamp: i64) -> SecurityResult<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| SecurityError::InvalidToken(format!("invalid exp claim {}", timestamp)))
}
