//! Scripted slurmrestd backend for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use slurmgate_client::{
    AdapterRegistry, Backend, Slurmrestd, SlurmrestdError, SlurmrestdResult, VersionDiscovery,
};
use slurmgate_shared::{ResourceQuery, SupportedVersions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Canned outcome of one query
#[derive(Debug, Clone)]
pub enum Answer {
    Payload(Value),
    NotFound,
    InvalidResponse,
    Internal,
    Connection,
    Authentication,
}

impl Answer {
    fn produce(&self, path: &str) -> SlurmrestdResult<Value> {
        match self {
            Answer::Payload(value) => Ok(value.clone()),
            Answer::NotFound => Err(SlurmrestdError::not_found(path)),
            Answer::InvalidResponse => Err(SlurmrestdError::invalid_response("text/html")),
            Answer::Internal => Err(SlurmrestdError::internal(9001, "Unknown plugin", "openapi")),
            Answer::Connection => Err(SlurmrestdError::connection("connection refused")),
            Answer::Authentication => Err(SlurmrestdError::authentication("status 401")),
        }
    }
}

/// Backend answering by URL path and recording every query in order
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    answers: Mutex<HashMap<String, Answer>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, path: &str, answer: Answer) {
        self.answers
            .lock()
            .unwrap()
            .insert(path.to_string(), answer);
    }

    pub fn ping(&self, version: &str, answer: Answer) {
        self.answer(&format!("/slurm/v{}/ping", version), answer);
    }

    pub fn ping_ok(&self, version: &str) {
        self.ping(
            version,
            Answer::Payload(json!({"slurm": {"cluster": "hpc", "release": "24.05.3"}})),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|call| *call == path).count()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn query(&self, query: &ResourceQuery) -> SlurmrestdResult<Value> {
        let path = query.url_path();
        self.calls.lock().unwrap().push(path.clone());
        let answer = self.answers.lock().unwrap().get(&path).cloned();
        match answer {
            Some(answer) => answer.produce(&path),
            None => Err(SlurmrestdError::not_found(path)),
        }
    }
}

pub fn versions(list: &[&str]) -> SupportedVersions {
    SupportedVersions::new(list.iter().copied()).unwrap()
}

/// Base client over a scripted backend, probing every supported version
pub fn client(backend: Arc<ScriptedBackend>, supported: &[&str], target: &str) -> Slurmrestd {
    let supported = versions(supported);
    let discovery = VersionDiscovery::new(
        supported.clone(),
        supported,
        target,
        AdapterRegistry::default(),
    )
    .unwrap();
    Slurmrestd::new(backend, discovery)
}
