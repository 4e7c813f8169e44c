//! Version negotiation against a scripted backend

mod common;

use common::{client, Answer, ScriptedBackend};
use pretty_assertions::assert_eq;
use serde_json::json;
use slurmgate_client::{ErrorKind, SlurmrestdApi, SlurmrestdError};
use std::sync::Arc;

const SUPPORTED: [&str; 3] = ["0.0.43", "0.0.42", "0.0.41"];

#[tokio::test]
async fn first_successful_version_wins() {
    let backend = ScriptedBackend::new();
    backend.ping("0.0.43", Answer::NotFound);
    backend.ping_ok("0.0.42");
    backend.ping_ok("0.0.41");

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    let endpoint = client.discover().await.unwrap();

    assert_eq!(endpoint.cluster, "hpc");
    assert_eq!(endpoint.release, "24.05.3");
    assert_eq!(endpoint.api_version, "0.0.42");
    assert_eq!(
        backend.calls(),
        vec!["/slurm/v0.0.43/ping", "/slurm/v0.0.42/ping"]
    );
}

#[tokio::test]
async fn fallthrough_errors_move_to_next_version() {
    let backend = ScriptedBackend::new();
    backend.ping("0.0.43", Answer::InvalidResponse);
    backend.ping("0.0.42", Answer::Internal);
    backend.ping("0.0.41", Answer::Payload(json!({"slurm": {"cluster": "hpc"}})));

    let client = client(backend.clone(), &["0.0.44", "0.0.43", "0.0.42", "0.0.41"], "0.0.44");
    let error = client.discover().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Connection);
    assert_eq!(
        backend.calls(),
        vec![
            "/slurm/v0.0.44/ping",
            "/slurm/v0.0.43/ping",
            "/slurm/v0.0.42/ping",
            "/slurm/v0.0.41/ping"
        ]
    );
}

#[tokio::test]
async fn connection_error_stops_discovery() {
    let backend = ScriptedBackend::new();
    backend.ping("0.0.43", Answer::Connection);
    backend.ping_ok("0.0.42");

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    let error = client.discover().await.unwrap_err();

    assert!(matches!(error, SlurmrestdError::Connection { .. }));
    assert_eq!(backend.calls(), vec!["/slurm/v0.0.43/ping"]);
}

#[tokio::test]
async fn authentication_error_stops_discovery() {
    let backend = ScriptedBackend::new();
    backend.ping("0.0.43", Answer::NotFound);
    backend.ping("0.0.42", Answer::Authentication);
    backend.ping_ok("0.0.41");

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    let error = client.discover().await.unwrap_err();

    assert!(matches!(error, SlurmrestdError::Authentication { .. }));
    assert_eq!(
        backend.calls(),
        vec!["/slurm/v0.0.43/ping", "/slurm/v0.0.42/ping"]
    );
}

#[tokio::test]
async fn exhaustion_lists_every_version_in_order() {
    let backend = ScriptedBackend::new();
    for version in SUPPORTED {
        backend.ping(version, Answer::NotFound);
    }

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    let error = client.discover().await.unwrap_err();

    match error {
        SlurmrestdError::Connection { message } => assert_eq!(
            message,
            "Unable to discover API version. Tried versions: 0.0.43, 0.0.42, 0.0.41"
        ),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn discovery_probes_once() {
    let backend = ScriptedBackend::new();
    backend.ping_ok("0.0.43");
    backend.answer("/slurm/v0.0.43/jobs", Answer::Payload(json!([])));

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    let first = client.discover().await.unwrap();
    let second = client.discover().await.unwrap();
    client.jobs().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.count("/slurm/v0.0.43/ping"), 1);
}

#[tokio::test]
async fn concurrent_first_calls_share_one_probe() {
    let backend = ScriptedBackend::new();
    backend.ping("0.0.43", Answer::NotFound);
    backend.ping_ok("0.0.42");

    let client = Arc::new(client(backend.clone(), &SUPPORTED, "0.0.43"));
    let (a, b) = tokio::join!(client.discover(), client.discover());

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(backend.count("/slurm/v0.0.42/ping"), 1);
}

#[tokio::test]
async fn failed_discovery_is_retried() {
    let backend = ScriptedBackend::new();
    backend.ping("0.0.43", Answer::Connection);

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    assert!(client.discover().await.is_err());

    backend.ping_ok("0.0.43");
    assert_eq!(client.discover().await.unwrap().api_version, "0.0.43");
}

#[tokio::test]
async fn resources_are_fetched_at_negotiated_version_and_adapted() {
    let backend = ScriptedBackend::new();
    backend.ping("0.0.43", Answer::NotFound);
    backend.ping("0.0.42", Answer::NotFound);
    backend.ping_ok("0.0.41");
    backend.answer(
        "/slurm/v0.0.41/nodes",
        Answer::Payload(json!([{"name": "cn1"}])),
    );

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    let nodes = client.nodes().await.unwrap();

    assert_eq!(
        nodes,
        json!([{"name": "cn1", "gpu_spec": "", "res_cores_per_gpu": 0, "cert_flags": []}])
    );
    assert_eq!(backend.count("/slurm/v0.0.41/nodes"), 1);
}

#[tokio::test]
async fn target_version_backend_is_not_adapted() {
    let backend = ScriptedBackend::new();
    backend.ping_ok("0.0.43");
    backend.answer(
        "/slurm/v0.0.43/nodes",
        Answer::Payload(json!([{"name": "cn1"}])),
    );

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    assert_eq!(client.nodes().await.unwrap(), json!([{"name": "cn1"}]));
}

#[tokio::test]
async fn node_names_stay_inside_the_node_endpoint() {
    let backend = ScriptedBackend::new();
    backend.ping_ok("0.0.43");
    backend.answer("/slurmdb/v0.0.43/users", Answer::Payload(json!([{"name": "root"}])));

    let client = client(backend.clone(), &SUPPORTED, "0.0.43");
    let error = client.node("../../slurmdb/v0.0.43/users").await.unwrap_err();
    assert!(matches!(error, SlurmrestdError::NotFound { .. }));

    for name in ["..", ".", ""] {
        let error = client.node(name).await.unwrap_err();
        assert!(matches!(error, SlurmrestdError::NotFound { .. }));
    }

    assert_eq!(
        backend.calls(),
        vec![
            "/slurm/v0.0.43/ping",
            "/slurm/v0.0.43/node/..%2F..%2Fslurmdb%2Fv0.0.43%2Fusers"
        ]
    );
}
