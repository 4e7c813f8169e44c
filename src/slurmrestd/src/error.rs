//! Error taxonomy of slurmrestd calls

use slurmgate_cache::CacheError;
use slurmgate_security::SecurityError;
use thiserror::Error;

/// Result type alias for slurmrestd operations
pub type SlurmrestdResult<T> = Result<T, SlurmrestdError>;

/// Failure of a slurmrestd call, classified at response validation time
#[derive(Error, Debug)]
pub enum SlurmrestdError {
    /// Network failure, timeout or exhausted version discovery
    #[error("slurmrestd connection error: {message}")]
    Connection { message: String },

    /// Requested entity does not exist
    #[error("slurmrestd not found: {message}")]
    NotFound { message: String },

    /// Credentials rejected by slurmrestd
    #[error("slurmrestd authentication error: {message}")]
    Authentication { message: String },

    /// Unexpected content type or malformed envelope
    #[error("slurmrestd invalid response: {message}")]
    InvalidResponse { message: String },

    /// Structured error reported in the response envelope
    #[error("slurmrestd error {code} ({origin}): {description}")]
    Internal {
        /// `error_number` of the first envelope error
        code: i64,
        description: String,
        /// `source` of the first envelope error
        origin: String,
    },

    /// Response cache unavailable or malfunctioning
    #[error("slurmrestd cache error: {source}")]
    Cache {
        #[from]
        source: CacheError,
    },

    /// Invalid client construction parameters
    #[error("slurmrestd client configuration error: {message}")]
    Configuration { message: String },
}

/// Kind of a [`SlurmrestdError`], for callers mapping errors to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    NotFound,
    Authentication,
    InvalidResponse,
    Internal,
    Cache,
    Configuration,
}

impl SlurmrestdError {
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn internal<D: Into<String>, O: Into<String>>(code: i64, description: D, origin: O) -> Self {
        Self::Internal {
            code,
            description: description.into(),
            origin: origin.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SlurmrestdError::Connection { .. } => ErrorKind::Connection,
            SlurmrestdError::NotFound { .. } => ErrorKind::NotFound,
            SlurmrestdError::Authentication { .. } => ErrorKind::Authentication,
            SlurmrestdError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            SlurmrestdError::Internal { .. } => ErrorKind::Internal,
            SlurmrestdError::Cache { .. } => ErrorKind::Cache,
            SlurmrestdError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Errors meaning "this API version is not served", discovery moves on
    pub fn is_discovery_fallthrough(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::InvalidResponse | ErrorKind::Internal
        )
    }

    /// HTTP status a web view should answer with
    pub fn status_hint(&self) -> u16 {
        match self.kind() {
            ErrorKind::Connection | ErrorKind::Cache => 503,
            ErrorKind::NotFound => 404,
            ErrorKind::Authentication => 401,
            ErrorKind::InvalidResponse | ErrorKind::Internal | ErrorKind::Configuration => 500,
        }
    }
}

/// Token production failures at call time
impl From<SecurityError> for SlurmrestdError {
    fn from(err: SecurityError) -> Self {
        SlurmrestdError::authentication(err.to_string())
    }
}

impl From<reqwest::Error> for SlurmrestdError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlurmrestdError::connection(format!("request timed out: {}", err))
        } else {
            SlurmrestdError::connection(err.to_string())
        }
    }
}

impl From<hyper::Error> for SlurmrestdError {
    fn from(err: hyper::Error) -> Self {
        SlurmrestdError::connection(err.to_string())
    }
}
