//! TLS+MQTT transport — the Transport component of the connectivity stack.
//!
//! Wraps `rumqttc::AsyncClient`/`EventLoop` behind a small trait so the rest
//! of the agent can be exercised against an in-memory mock without a broker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use serde::Serialize;
use tokio::time::timeout;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::tls;

/// Called once per received PUBLISH, regardless of topic. Routing is the
/// consumer's responsibility (see `dms_protocol::topics::classify`).
pub type IncomingHandler = Arc<dyn Fn(String, Vec<u8>) + Send + Sync>;

/// Abstraction over a TLS+MQTT session: connect, publish, subscribe, and a
/// single cooperative event-pump step.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> TransportResult<()>;
    async fn subscribe(&self, topic: &str) -> TransportResult<()>;

    /// Drive the event loop for one step (bounded by an internal timeout).
    /// Every PUBLISH received during the step is delivered to the handler
    /// registered at construction, in arrival order.
    async fn process_loop(&mut self) -> TransportResult<()>;

    async fn disconnect(&mut self) -> TransportResult<()>;
}

/// Real MQTT channel connected to the DMS broker.
pub struct MqttChannel {
    client: AsyncClient,
    eventloop: EventLoop,
    pump_timeout: Duration,
    on_publish: IncomingHandler,
}

impl MqttChannel {
    /// Establish TLS + MQTT session. `on_publish` is invoked for every
    /// inbound PUBLISH observed by `process_loop`.
    pub async fn connect(config: &TransportConfig, on_publish: IncomingHandler) -> TransportResult<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keepalive_secs.into()));

        let transport = if config.use_tls {
            tls::load_tls_transport(config).map_err(|e| TransportError::TlsFailure(e.to_string()))?
        } else {
            tls::plaintext_transport()
        };
        options.set_transport(transport);

        // QoS-1 tracking capacity: 10 outgoing, 10 incoming in flight.
        let (client, eventloop) = AsyncClient::new(options, 10);

        let mut channel = MqttChannel {
            client,
            eventloop,
            pump_timeout: Duration::from_secs(config.connect_timeout_secs.max(1)),
            on_publish,
        };

        // Drive the loop until the broker acknowledges the connection (or we
        // time out) so `connect()` only returns once the session is usable.
        let deadline = Duration::from_secs(config.connect_timeout_secs.max(1));
        loop {
            match timeout(deadline, channel.eventloop.poll()).await {
                Ok(Ok(Event::Incoming(Incoming::ConnAck(_)))) => break,
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(TransportError::MqttFailure(e.to_string())),
                Err(_) => return Err(TransportError::Timeout),
            }
        }

        channel.pump_timeout = Duration::from_secs(config.pump_timeout_secs.max(1));
        Ok(channel)
    }
}

#[async_trait]
impl Channel for MqttChannel {
    async fn publish(&self, topic: &str, payload: &[u8]) -> TransportResult<()> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<()> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn process_loop(&mut self) -> TransportResult<()> {
        match timeout(self.pump_timeout, self.eventloop.poll()).await {
            Ok(Ok(Event::Incoming(Incoming::Publish(publish)))) => {
                (self.on_publish)(publish.topic, publish.payload.to_vec());
                Ok(())
            }
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(TransportError::RecvFailed(e.to_string())),
            Err(_) => Ok(()), // pump timeout is a normal "nothing happened" tick
        }
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

/// Convenience helper shared by `dms-transport` consumers: serialize and
/// publish a JSON payload in one call.
pub async fn publish_json<C: Channel + ?Sized, T: Serialize>(
    channel: &C,
    topic: &str,
    payload: &T,
) -> TransportResult<()> {
    let bytes = serde_json::to_vec(payload).map_err(|e| TransportError::Serialization(e.to_string()))?;
    channel.publish(topic, &bytes).await
}
