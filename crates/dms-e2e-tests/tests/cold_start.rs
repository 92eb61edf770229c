//! Spec §8 scenarios 1–2: cold-start bootstrap, bound and unbound device.

mod helpers;

use std::sync::Arc;

use dms_agent::backend::MockDeviceBackend;
use dms_agent::log_producer::MockLogProducer;
use dms_agent::supervisor::Supervisor;
use dms_rest::RestClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{TestConnection, identity, reconnect_config, rest_config, shadow_engine};

#[tokio::test]
async fn bound_device_skips_registration() {
    let server = MockServer::start().await;
    // No register/pincode mocks mounted: a call to either would panic the
    // mock server's unmatched-request guard, proving bootstrap never calls them.

    let shadow = shadow_engine();
    // Simulate the broker replying to the initial `shadow/get` with a
    // document that already carries a binding.
    shadow.handle_inbound(
        "dms/dms-AABBCCDDEEFF/shadow/get/accepted",
        serde_json::to_vec(&serde_json::json!({
            "state": {"reported": {"info": {
                "company_name": "ACME", "company_id": "c7",
                "device_name": "rx-01", "added_by": "alice"
            }}}
        }))
        .unwrap()
        .as_slice(),
    );

    let conn = TestConnection::new(shadow.clone());
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

    supervisor.bootstrap().await.unwrap();
    assert!(supervisor.shadow().is_device_bound());
}

#[tokio::test]
async fn unbound_device_registers_and_requests_a_pincode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/device/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/device/pincode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "pincode": "4242", "expired_at": "2030-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let shadow = shadow_engine();
    let conn = TestConnection::new(shadow.clone());
    let rest = RestClient::new(rest_config(server.uri()));
    let mut supervisor = Supervisor::new(
        identity(),
        Arc::clone(&shadow),
        conn,
        rest,
        MockDeviceBackend::new(),
        None::<MockLogProducer>,
        reconnect_config(),
        std::time::Duration::from_secs(60),
    );

    supervisor.bootstrap().await.unwrap();
    assert!(!supervisor.shadow().is_device_bound());
    assert!(supervisor.is_connected());
}
