//! DMS device agent — binary entry point.
//!
//! Loads config, wires transport/shadow/REST/reconnect into a
//! `Supervisor`, then races the steady-state loop against a shutdown
//! signal. Mirrors `zc-fleet-agent::main`'s `tokio::select!` shape.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use dms_agent::backend::MockDeviceBackend;
use dms_agent::config::AgentConfig;
use dms_agent::log_producer::MockLogProducer;
use dms_agent::supervisor::{MqttConnection, Supervisor};
use dms_protocol::identity::Identity;
use dms_rest::RestClient;
use dms_transport::shadow::ShadowEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dms-agent starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/dms/agent.toml".to_string());
    let config = AgentConfig::from_file(&config_path)?;

    let identity: Identity = config.identity.clone().into();
    tracing::info!(client_id = %identity.client_id(), "config loaded");

    let shadow = Arc::new(ShadowEngine::new(config.shadow_root.clone(), identity.client_id()));
    let conn = MqttConnection::new(config.transport.clone(), shadow.clone());
    let rest = RestClient::new(config.rest.clone());

    // Injected WiFi/radio control plane and log-artifact capability are
    // platform integrations out of this repository's scope (spec §1);
    // `MockDeviceBackend` is the trivial stand-in (see DESIGN.md).
    let backend = MockDeviceBackend::new();
    let log_producer: Option<MockLogProducer> = None;

    let mut supervisor = Supervisor::new(
        identity,
        shadow,
        conn,
        rest,
        backend,
        log_producer,
        config.reconnect,
        Duration::from_secs(config.heartbeat_interval_secs),
    );

    if let Err(e) = supervisor.bootstrap().await {
        tracing::error!(error = %e, "initial connection failed");
        return Err(anyhow::anyhow!("bootstrap failed: {e}"));
    }

    // The supervisor polls this flag at its own tick boundaries (spec §5),
    // so the signal wait runs alongside it rather than racing it in a
    // `select!` that would drop the loop mid-tick.
    let cancel = supervisor.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            cancel.cancel();
        }
    });

    supervisor.run().await;

    tracing::info!("dms-agent stopped");
    Ok(())
}
