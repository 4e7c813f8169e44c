//! Full client against a fake slurmrestd served over HTTP

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use slurmgate_client::{
    Slurmrestd, SlurmrestdApi, SlurmrestdError, AUTHENTICATION_NOT_APPLICABLE, INVALID_JOB_ID_ERROR,
    LIVE_JOB_KEY,
};
use slurmgate_shared::{AuthConfig, AuthMode, JwtMode, SlurmrestdConfig};
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(key: &str, payload: Value) -> Value {
    let mut envelope = json!({"errors": [], "warnings": [], "meta": {}});
    envelope[key] = payload;
    envelope
}

fn ping_envelope() -> Value {
    envelope(
        "meta",
        json!({"slurm": {"cluster": "tiny", "release": "24.11.0"}}),
    )
}

struct Fixture {
    server: MockServer,
    _key: NamedTempFile,
    config: SlurmrestdConfig,
}

async fn fixture() -> Fixture {
    let server = MockServer::start().await;
    let mut key = NamedTempFile::new().unwrap();
    key.write_all(b"slurm-jwt-signing-key").unwrap();

    let config = SlurmrestdConfig {
        uri: server.uri(),
        timeout_seconds: 1,
        auth: AuthConfig {
            mode: AuthMode::Jwt,
            jwt_mode: JwtMode::Auto,
            jwt_key: Some(key.path().to_path_buf()),
            ..AuthConfig::default()
        },
        ..SlurmrestdConfig::default()
    };

    Fixture {
        server,
        _key: key,
        config,
    }
}

async fn mount_ping(server: &MockServer, version: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/slurm/v{}/ping", version)))
        .and(header("X-SLURM-USER-NAME", "slurm"))
        .and(header_exists("X-SLURM-USER-TOKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ping_envelope()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn discovery_skips_unserved_version_and_adapts() {
    let fixture = fixture().await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.43/ping"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&fixture.server)
        .await;
    mount_ping(&fixture.server, "0.0.42").await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.42/reservations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope("reservations", json!([{"name": "maint"}]))),
        )
        .expect(1)
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    let endpoint = client.discover().await.unwrap();
    assert_eq!(endpoint.cluster, "tiny");
    assert_eq!(endpoint.api_version, "0.0.42");

    let reservations = client.reservations().await.unwrap();
    assert_eq!(
        reservations,
        json!([{
            "name": "maint",
            "purge_completed": {"time": {"set": false, "infinite": false, "number": 0}}
        }])
    );
}

#[tokio::test]
async fn unauthorized_ping_aborts_discovery() {
    let fixture = fixture().await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.43/ping"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fixture.server)
        .await;
    mount_ping(&fixture.server, "0.0.42").await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    let error = client.discover().await.unwrap_err();

    assert!(matches!(error, SlurmrestdError::Authentication { .. }));
    assert_eq!(fixture.server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn authentication_sentinel_is_an_authentication_error() {
    let fixture = fixture().await;
    mount_ping(&fixture.server, "0.0.43").await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.43/jobs"))
        .respond_with(ResponseTemplate::new(500).set_body_string(AUTHENTICATION_NOT_APPLICABLE))
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    let error = client.jobs().await.unwrap_err();
    assert_eq!(error.status_hint(), 401);
}

#[tokio::test]
async fn envelope_error_is_reported_with_its_fields() {
    let fixture = fixture().await;
    mount_ping(&fixture.server, "0.0.43").await;
    Mock::given(method("GET"))
        .and(path("/slurmdb/v0.0.43/qos"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "qos": [],
            "errors": [{
                "error": "Unable to connect to database",
                "error_number": 7000,
                "description": "Failed to open slurmdbd connection",
                "source": "slurmdb_connection_get"
            }],
            "warnings": []
        })))
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    match client.qos().await.unwrap_err() {
        SlurmrestdError::Internal {
            code,
            description,
            origin,
        } => {
            assert_eq!(code, 7000);
            assert_eq!(description, "Failed to open slurmdbd connection");
            assert_eq!(origin, "slurmdb_connection_get");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn job_detail_overlays_live_record() {
    let fixture = fixture().await;
    mount_ping(&fixture.server, "0.0.43").await;
    Mock::given(method("GET"))
        .and(path("/slurmdb/v0.0.43/job/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            "jobs",
            json!([{"job_id": 42, "state": {"current": ["RUNNING"]}}]),
        )))
        .mount(&fixture.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.43/job/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            "jobs",
            json!([{"job_id": 42, "job_state": ["RUNNING"]}]),
        )))
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    let job = client.job(42).await.unwrap();

    assert_eq!(job["job_id"], 42);
    assert_eq!(job[LIVE_JOB_KEY]["job_state"], json!(["RUNNING"]));
}

#[tokio::test]
async fn job_detail_without_live_record() {
    let fixture = fixture().await;
    mount_ping(&fixture.server, "0.0.43").await;
    Mock::given(method("GET"))
        .and(path("/slurmdb/v0.0.43/job/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope("jobs", json!([{"job_id": 7}]))),
        )
        .mount(&fixture.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.43/job/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "jobs": [],
            "errors": [{"error_number": INVALID_JOB_ID_ERROR, "description": "Invalid job id specified", "source": "_handle_job_get"}],
            "warnings": []
        })))
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    let job = client.job(7).await.unwrap();

    assert_eq!(job, json!({"job_id": 7}));
}

#[tokio::test]
async fn job_detail_reports_controller_failures() {
    let fixture = fixture().await;
    mount_ping(&fixture.server, "0.0.43").await;
    Mock::given(method("GET"))
        .and(path("/slurmdb/v0.0.43/job/8"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope("jobs", json!([{"job_id": 8}]))),
        )
        .mount(&fixture.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.43/job/8"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "jobs": [],
            "errors": [{"error_number": 7000, "description": "Unable to contact slurmctld", "source": "slurm_load_job"}],
            "warnings": []
        })))
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    match client.job(8).await.unwrap_err() {
        SlurmrestdError::Internal { code, .. } => assert_eq!(code, 7000),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn missing_accounting_job_is_not_found() {
    let fixture = fixture().await;
    mount_ping(&fixture.server, "0.0.43").await;
    Mock::given(method("GET"))
        .and(path("/slurmdb/v0.0.43/job/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("jobs", json!([]))))
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    let error = client.job(9).await.unwrap_err();
    assert!(matches!(error, SlurmrestdError::NotFound { .. }));
}

#[tokio::test]
async fn slow_backend_times_out_as_connection_error() {
    let fixture = fixture().await;
    Mock::given(method("GET"))
        .and(path("/slurm/v0.0.43/ping"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ping_envelope())
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&fixture.server)
        .await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    let error = client.discover().await.unwrap_err();
    assert!(matches!(error, SlurmrestdError::Connection { .. }));
}

#[tokio::test]
async fn version_override_probes_only_that_version() {
    let mut fixture = fixture().await;
    fixture.config.version_override = Some("0.0.41".to_string());
    mount_ping(&fixture.server, "0.0.41").await;

    let client = Slurmrestd::from_config(&fixture.config).unwrap();
    assert_eq!(client.discover().await.unwrap().api_version, "0.0.41");

    let requests = fixture.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/slurm/v0.0.41/ping");
}

#[test]
fn local_authentication_over_tcp_is_rejected() {
    let config = SlurmrestdConfig {
        uri: "http://slurmrestd:6820".to_string(),
        ..SlurmrestdConfig::default()
    };
    assert!(matches!(
        Slurmrestd::from_config(&config),
        Err(SlurmrestdError::Configuration { .. })
    ));
}
