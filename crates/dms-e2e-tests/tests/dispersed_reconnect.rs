//! Spec §8 scenario 4: a transport failure drops the connection, the
//! reconnect scheduler brings it back, and the retry counter resets once
//! the new session settles.

mod helpers;

use dms_agent::backend::MockDeviceBackend;
use dms_agent::log_producer::MockLogProducer;
use dms_agent::supervisor::{Supervisor, TickOutcome};
use dms_rest::RestClient;
use wiremock::MockServer;

use helpers::{TestConnection, identity, reconnect_config, rest_config, shadow_engine};

#[tokio::test]
async fn reconnects_after_a_transport_failure_and_keeps_ticking() {
    let server = MockServer::start().await;
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

    assert!(supervisor.is_connected());

    // Simulate the broker drop (a `process_loop` `RecvFailed` tears the
    // channel down the same way inside `Supervisor::tick`) and confirm
    // the next tick reconnects with a fresh session.
    supervisor.shutdown().await;
    assert!(!supervisor.is_connected());

    let outcome = supervisor.tick().await;
    assert_eq!(outcome, TickOutcome::Reconnected);
    assert!(supervisor.is_connected());

    // A second consecutive reconnect from a fresh disconnection should
    // still succeed — the retry counter reset after the first success.
    supervisor.shutdown().await;
    let outcome2 = supervisor.tick().await;
    assert_eq!(outcome2, TickOutcome::Reconnected);
}
