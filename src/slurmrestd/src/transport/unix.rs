//! Unix socket transport
//!
//! One HTTP/1.1 connection per request, driven in place by the calling task.

use super::{RawResponse, Transport};
use crate::error::{SlurmrestdError, SlurmrestdResult};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header::{CONNECTION, CONTENT_TYPE, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use slurmgate_security::AuthHeaders;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::UnixStream;
use tracing::debug;

/// slurmrestd reached through its local Unix socket
#[derive(Debug, Clone)]
pub struct UnixTransport {
    socket: PathBuf,
    timeout: Duration,
}

impl UnixTransport {
    pub fn new(socket: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket: socket.into(),
            timeout,
        }
    }

    async fn exchange(&self, path: &str, headers: &AuthHeaders) -> SlurmrestdResult<RawResponse> {
        let stream = UnixStream::connect(&self.socket).await.map_err(|e| {
            SlurmrestdError::connection(format!(
                "Unable to connect to slurmrestd socket {}: {}",
                self.socket.display(),
                e
            ))
        })?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;

        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(HOST, "localhost")
            .header(CONNECTION, "close");
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        let request = builder.body(Empty::<Bytes>::new()).map_err(|e| {
            SlurmrestdError::connection(format!("Invalid slurmrestd request {}: {}", path, e))
        })?;

        // The sender is moved in and dropped once the body is read, letting
        // the connection future complete.
        let response = async move {
            let response = sender.send_request(request).await?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.into_body().collect().await?.to_bytes();
            Ok::<_, hyper::Error>((status, content_type, body))
        };

        let (response, conn_result) = tokio::join!(response, conn);
        let (status, content_type, body) = response?;
        if let Err(e) = conn_result {
            debug!("slurmrestd socket connection closed with error: {}", e);
        }

        debug!(method = "GET", path, status, "slurmrestd query");
        Ok(RawResponse {
            status,
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[async_trait]
impl Transport for UnixTransport {
    async fn get(&self, path: &str, headers: &AuthHeaders) -> SlurmrestdResult<RawResponse> {
        tokio::time::timeout(self.timeout, self.exchange(path, headers))
            .await
            .map_err(|_| {
                SlurmrestdError::connection(format!(
                    "slurmrestd request {} timed out after {} seconds",
                    path,
                    self.timeout.as_secs()
                ))
            })?
    }

    fn is_local(&self) -> bool {
        true
    }

    fn endpoint(&self) -> String {
        format!("unix://{}", self.socket.display())
    }
}
