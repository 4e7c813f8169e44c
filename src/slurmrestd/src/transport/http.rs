//! TCP transport over a pooled reqwest client

use super::{RawResponse, Transport};
use crate::error::{SlurmrestdError, SlurmrestdResult};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use slurmgate_security::AuthHeaders;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// slurmrestd reached over HTTP(S), connections are pooled across calls
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    http_client: Client,
}

impl HttpTransport {
    pub fn new(uri: &str, timeout: Duration) -> SlurmrestdResult<Self> {
        let base_url = Url::parse(uri).map_err(|e| {
            SlurmrestdError::configuration(format!("Invalid slurmrestd URI {}: {}", uri, e))
        })?;

        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                SlurmrestdError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, headers: &AuthHeaders) -> SlurmrestdResult<RawResponse> {
        let url = self.url_for(path);
        let mut request = self.http_client.get(&url);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        debug!(method = "GET", %url, status, "slurmrestd query");
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    fn is_local(&self) -> bool {
        false
    }

    fn endpoint(&self) -> String {
        self.base_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport = HttpTransport::new("http://slurmrestd:6820/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            transport.url_for("/slurm/v0.0.43/ping"),
            "http://slurmrestd:6820/slurm/v0.0.43/ping"
        );
    }

    #[test]
    fn test_invalid_uri_is_configuration_error() {
        assert!(matches!(
            HttpTransport::new("http://", Duration::from_secs(1)),
            Err(SlurmrestdError::Configuration { .. })
        ));
    }
}
