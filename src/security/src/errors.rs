//! Security Error Types
//!
//! Errors raised while building or using slurmrestd credentials.

use thiserror::Error;

/// Main security error type
#[derive(Error, Debug)]
pub enum SecurityError {
    // Construction errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unable to read JWT key {path}: {message}")]
    KeyFile { path: String, message: String },

    // Token errors
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired: {0}")]
    TokenExpired(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

/// Result type for security operations
pub type SecurityResult<T> = Result<T, SecurityError>;

impl From<jsonwebtoken::errors::Error> for SecurityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                SecurityError::TokenExpired("JWT token expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                SecurityError::InvalidToken(format!("missing claim {}", claim))
            }
            _ => SecurityError::InvalidToken(err.to_string()),
        }
    }
}
