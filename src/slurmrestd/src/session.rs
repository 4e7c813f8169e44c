//! Authenticated, validated queries

use crate::error::SlurmrestdResult;
use crate::transport::Transport;
use crate::validator::validate;
use async_trait::async_trait;
use serde_json::Value;
use slurmgate_security::AuthenticationManager;
use slurmgate_shared::ResourceQuery;
use std::sync::Arc;

/// Something answering versioned resource queries with envelope payloads
#[async_trait]
pub trait Backend: Send + Sync {
    async fn query(&self, query: &ResourceQuery) -> SlurmrestdResult<Value>;
}

/// Transport plus credentials plus response validation
#[derive(Debug)]
pub struct Session {
    transport: Arc<dyn Transport>,
    auth: AuthenticationManager,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, auth: AuthenticationManager) -> Self {
        Self { transport, auth }
    }
}

#[async_trait]
impl Backend for Session {
    async fn query(&self, query: &ResourceQuery) -> SlurmrestdResult<Value> {
        let headers = self.auth.headers()?;
        let response = self.transport.get(&query.url_path(), &headers).await?;
        validate(&response, query)
    }
}
