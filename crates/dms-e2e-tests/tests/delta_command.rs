//! Spec §8 scenario 3: a `control-config-change` shadow delta drives the
//! full GET → apply → REST progress update → shadow ack chain.

mod helpers;

use dms_agent::backend::{BackendError, MockDeviceBackend};
use dms_agent::log_producer::MockLogProducer;
use dms_agent::supervisor::{Supervisor, TickOutcome};
use dms_rest::RestClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{TestConnection, identity, reconnect_config, rest_config, shadow_engine};

#[tokio::test]
async fn control_config_change_delta_is_applied_and_acked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/device/control-config/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result_code": "200",
            "control-configs": [
                {"status_progress_id": 7, "item": "ssid", "type": 1, "value": "guest-net"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/device/control/progress/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let shadow = shadow_engine();
    let mut conn = TestConnection::new(shadow.clone());
    conn.connect().await.unwrap();

    let rest = RestClient::new(rest_config(server.uri()));
    let mut supervisor = Supervisor::new(
        identity(),
        shadow.clone(),
        conn,
        rest,
        MockDeviceBackend::new(),
        None::<MockLogProducer>,
        reconnect_config(),
        std::time::Duration::from_secs(60),
    );

    shadow.handle_inbound(
        "dms/dms-AABBCCDDEEFF/shadow/update/delta",
        serde_json::to_vec(&serde_json::json!({"state": {"desired": {"control-config-change": 1}}}))
            .unwrap()
            .as_slice(),
    );

    let outcome = supervisor.tick().await;
    assert_eq!(outcome, TickOutcome::Active);
}

#[tokio::test]
async fn backend_rejection_still_completes_the_ack_chain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/device/control-config/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result_code": "200",
            "control-configs": [
                {"status_progress_id": 8, "item": "ssid", "type": 1, "value": "bad-value"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/device/control/progress/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let shadow = shadow_engine();
    let mut conn = TestConnection::new(shadow.clone());
    conn.connect().await.unwrap();

    let rest = RestClient::new(rest_config(server.uri()));
    let backend = MockDeviceBackend::with_responses(vec![Err(BackendError::Rejected {
        item: "ssid".into(),
        code: 4,
        reason: "invalid value".into(),
    })]);
    let mut supervisor = Supervisor::new(
        identity(),
        shadow.clone(),
        conn,
        rest,
        backend,
        None::<MockLogProducer>,
        reconnect_config(),
        std::time::Duration::from_secs(60),
    );

    shadow.handle_inbound(
        "dms/dms-AABBCCDDEEFF/shadow/update/delta",
        serde_json::to_vec(&serde_json::json!({"state": {"desired": {"control-config-change": 1}}}))
            .unwrap()
            .as_slice(),
    );

    // Backend rejection should not crash the tick, and the ack chain
    // (reset_desired + report_command_result) still runs to completion.
    let outcome = supervisor.tick().await;
    assert_eq!(outcome, TickOutcome::Active);
}
