//! Shared harness for the end-to-end tests: an in-memory `ManagedConnection`
//! over `dms_transport::mock::MockChannel`, plus the identity/reconnect
//! fixtures every scenario in spec §8 builds a `Supervisor` from.

use std::sync::Arc;

use async_trait::async_trait;

use dms_agent::reconnect::ReconnectConfig;
use dms_agent::supervisor::ManagedConnection;
use dms_protocol::identity::{DeviceSubtype, DeviceType, Identity};
use dms_rest::RestConfig;
use dms_transport::mock::MockChannel;
use dms_transport::shadow::ShadowEngine;

/// `ManagedConnection` over a `MockChannel`, wired so every fresh `connect()`
/// routes inbound publishes straight into the shared shadow engine, the same
/// way `MqttConnection` wires a real broker session.
pub struct TestConnection {
    shadow: Arc<ShadowEngine>,
    channel: Option<MockChannel>,
    fail_connect: bool,
    pub connects: u32,
}

impl TestConnection {
    pub fn new(shadow: Arc<ShadowEngine>) -> Self {
        TestConnection {
            shadow,
            channel: None,
            fail_connect: false,
            connects: 0,
        }
    }

    pub fn failing(shadow: Arc<ShadowEngine>) -> Self {
        TestConnection {
            shadow,
            channel: None,
            fail_connect: true,
            connects: 0,
        }
    }
}

#[async_trait]
impl ManagedConnection for TestConnection {
    type Channel = MockChannel;

    async fn disconnect(&mut self) {
        self.channel = None;
    }

    async fn connect(&mut self) -> Result<(), String> {
        if self.fail_connect {
            return Err("simulated connect failure".into());
        }
        self.connects += 1;
        let shadow = self.shadow.clone();
        let mock = MockChannel::new();
        mock.set_handler(Arc::new(move |topic, payload| {
            shadow.handle_inbound(&topic, &payload);
        }));
        self.channel = Some(mock);
        Ok(())
    }

    fn channel_mut(&mut self) -> Option<&mut MockChannel> {
        self.channel.as_mut()
    }
}

pub fn identity() -> Identity {
    Identity {
        model: "RX-9000".into(),
        serial: "SN12345".into(),
        mac: "AA:BB:CC:DD:EE:FF".into(),
        panel: "65in".into(),
        brand: "Acme".into(),
        device_type: DeviceType::PublicDisplay,
        device_subtype: DeviceSubtype::Embedded,
        country_code: "US".into(),
        firmware_version: "1.2.3".into(),
        architecture: vec!["arm64".into()],
    }
}

pub fn reconnect_config() -> ReconnectConfig {
    ReconnectConfig {
        base_delay_seconds: 1,
        max_delay_seconds: 10,
        max_retry_attempts: 3,
    }
}

pub fn rest_config(base_url: String) -> RestConfig {
    RestConfig {
        base_url,
        product_key: "test-key".into(),
        product_type: "display".into(),
        timeout_secs: 5,
    }
}

pub fn shadow_engine() -> Arc<ShadowEngine> {
    Arc::new(ShadowEngine::new("dms", identity().client_id()))
}
