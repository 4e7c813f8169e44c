//! Transports carrying one GET request to slurmrestd
//!
//! The transport is selected from the URI scheme: `unix://` for the local
//! socket, `http://` or `https://` for a TCP endpoint.

pub mod http;
pub mod unix;

use crate::error::{SlurmrestdError, SlurmrestdResult};
use async_trait::async_trait;
use slurmgate_security::AuthHeaders;
use std::sync::Arc;
use std::time::Duration;

pub use self::http::HttpTransport;
pub use self::unix::UnixTransport;

/// Raw HTTP answer, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// JSON answer with status 200
    pub fn json(body: impl Into<String>) -> Self {
        Self::new(200, Some("application/json"), body)
    }
}

/// One request, one response; failures to get any response are `Connection`
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// GET `path` with the given headers
    async fn get(&self, path: &str, headers: &AuthHeaders) -> SlurmrestdResult<RawResponse>;

    /// Whether the peer is the trusted local socket
    fn is_local(&self) -> bool;

    /// Endpoint description for logs
    fn endpoint(&self) -> String;
}

/// Build the transport for a slurmrestd URI
pub fn connect(uri: &str, timeout: Duration) -> SlurmrestdResult<Arc<dyn Transport>> {
    if let Some(path) = uri.strip_prefix("unix://") {
        if path.is_empty() {
            return Err(SlurmrestdError::configuration(format!(
                "Missing socket path in slurmrestd URI {}",
                uri
            )));
        }
        return Ok(Arc::new(UnixTransport::new(path, timeout)));
    }

    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(Arc::new(HttpTransport::new(uri, timeout)?));
    }

    Err(SlurmrestdError::configuration(format!(
        "Unsupported slurmrestd URI scheme: {}",
        uri
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_selects_transport_by_scheme() {
        let timeout = Duration::from_secs(5);

        let transport = connect("unix:///run/slurmrestd/slurmrestd.socket", timeout).unwrap();
        assert!(transport.is_local());
        assert_eq!(transport.endpoint(), "unix:///run/slurmrestd/slurmrestd.socket");

        let transport = connect("http://slurmrestd:6820", timeout).unwrap();
        assert!(!transport.is_local());
    }

    #[test]
    fn test_connect_rejects_unknown_scheme() {
        let timeout = Duration::from_secs(5);
        assert!(matches!(
            connect("ftp://slurmrestd", timeout),
            Err(SlurmrestdError::Configuration { .. })
        ));
        assert!(matches!(
            connect("unix://", timeout),
            Err(SlurmrestdError::Configuration { .. })
        ));
    }
}
