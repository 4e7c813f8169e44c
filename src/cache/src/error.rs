//! Cache error types

use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache store failures, always distinct from a plain miss
#[derive(Error, Debug)]
pub enum CacheError {
    /// Store unreachable
    #[error("Cache connection error: {message}")]
    Connection { message: String },

    /// Store reachable but the command failed
    #[error("Cache operation error: {message}")]
    Operation { message: String },

    /// Cached value could not be encoded or decoded
    #[error("Cache serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn operation<S: Into<String>>(message: S) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }

    /// Store unavailable, as opposed to a bad value
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::Connection { .. })
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            CacheError::connection(err.to_string())
        } else {
            CacheError::operation(err.to_string())
        }
    }
}
