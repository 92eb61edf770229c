//! Supervisor — composes transport, shadow engine, command dispatcher,
//! reconnect scheduler and REST client into the steady-state loop (spec
//! §4.6). Grounded on `zc-fleet-agent::main`'s `tokio::select!` shape and
//! `mqtt_loop::run`'s event-pump-plus-dispatch loop, generalized from a
//! fixed tool registry to the shadow/dispatcher/reconnect trio.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use dms_protocol::identity::{DeviceType, Identity};
use dms_rest::RestClient;
use dms_transport::channel::{Channel, IncomingHandler, MqttChannel};
use dms_transport::config::TransportConfig;
use dms_transport::shadow::ShadowEngine;

use crate::backend::DeviceBackend;
use crate::dispatcher::{CommandDispatcher, snapshot_reported_state};
use crate::log_producer::LogProducer;
use crate::reconnect::{CancelFlag, ReconnectCapabilities, ReconnectConfig, ReconnectScheduler};

/// Owns the channel slot for one connection attempt and knows how to
/// (re)establish it. Kept separate from `Channel` itself because
/// reconnecting a real `MqttChannel` means building a fresh TLS+MQTT
/// session, not mutating one in place.
#[async_trait]
pub trait ManagedConnection: Send {
    type Channel: Channel;

    async fn disconnect(&mut self);
    /// Establish a fresh session, storing it so `channel_mut` returns it.
    async fn connect(&mut self) -> Result<(), String>;
    fn channel_mut(&mut self) -> Option<&mut Self::Channel>;
}

/// Adapts any `ManagedConnection` into `ReconnectCapabilities`, wiring
/// `shadow_restart` to `ShadowEngine::start` on whatever channel `connect`
/// just produced.
struct ManagedConnectionAdapter<'a, M: ManagedConnection> {
    conn: &'a mut M,
    shadow: &'a ShadowEngine,
}

#[async_trait]
impl<'a, M: ManagedConnection> ReconnectCapabilities for ManagedConnectionAdapter<'a, M> {
    async fn disconnect(&mut self) {
        self.conn.disconnect().await;
    }

    async fn connect(&mut self) -> Result<(), String> {
        self.conn.connect().await
    }

    async fn shadow_restart(&mut self) -> Result<(), String> {
        match self.conn.channel_mut() {
            Some(channel) => self.shadow.start(channel).await.map_err(|e| e.to_string()),
            None => Err("no channel available after connect".to_string()),
        }
    }
}

/// Real `ManagedConnection` over `rumqttc`. Every `connect()` tears down
/// any existing session and builds a new TLS+MQTT one; inbound publishes
/// route straight into the shared shadow engine.
pub struct MqttConnection {
    config: TransportConfig,
    shadow: Arc<ShadowEngine>,
    channel: Option<MqttChannel>,
}

impl MqttConnection {
    pub fn new(config: TransportConfig, shadow: Arc<ShadowEngine>) -> Self {
        MqttConnection {
            config,
            shadow,
            channel: None,
        }
    }
}

#[async_trait]
impl ManagedConnection for MqttConnection {
    type Channel = MqttChannel;

    async fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            let _ = channel.disconnect().await;
        }
    }

    async fn connect(&mut self) -> Result<(), String> {
        let shadow = self.shadow.clone();
        let handler: IncomingHandler = Arc::new(move |topic, payload| {
            shadow.handle_inbound(&topic, &payload);
        });
        let channel = MqttChannel::connect(&self.config, handler)
            .await
            .map_err(|e| e.to_string())?;
        self.channel = Some(channel);
        Ok(())
    }

    fn channel_mut(&mut self) -> Option<&mut MqttChannel> {
        self.channel.as_mut()
    }
}

/// Result of one `Supervisor::tick` — tells the caller (normally just
/// `run`'s loop condition) whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Active,
    Disconnected,
    Reconnected,
    RetryFailed,
    Exhausted,
}

fn device_type_label(t: DeviceType) -> &'static str {
    match t {
        DeviceType::PublicDisplay => "public_display",
        DeviceType::Ifp => "ifp",
        DeviceType::Signage => "signage",
        DeviceType::Projector => "projector",
        DeviceType::Ops => "ops",
        DeviceType::Linux => "linux",
    }
}

/// Composes the four CORE subsystems plus the injected capabilities into
/// the agent's single thread of control (spec §4.6, §5). Owns every piece
/// of mutable state directly — no `Arc<Mutex<_>>` — since `run`/`tick` are
/// the only callers driving it forward.
pub struct Supervisor<M: ManagedConnection, B: DeviceBackend, L: LogProducer> {
    identity: Identity,
    shadow: Arc<ShadowEngine>,
    rest: RestClient,
    backend: B,
    log_producer: Option<L>,
    reconnect: ReconnectScheduler,
    conn: M,
    cancel: CancelFlag,
    heartbeat_interval: Duration,
    last_heartbeat: Option<Instant>,
}

impl<M: ManagedConnection, B: DeviceBackend, L: LogProducer> Supervisor<M, B, L> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: Identity,
        shadow: Arc<ShadowEngine>,
        conn: M,
        rest: RestClient,
        backend: B,
        log_producer: Option<L>,
        reconnect_config: ReconnectConfig,
        heartbeat_interval: Duration,
    ) -> Self {
        let mac_seed = identity.mac_colonless();
        Supervisor {
            identity,
            shadow,
            rest,
            backend,
            log_producer,
            reconnect: ReconnectScheduler::new(reconnect_config, mac_seed),
            conn,
            cancel: CancelFlag::new(),
            heartbeat_interval,
            last_heartbeat: None,
        }
    }

    /// Shareable cancellation handle; wire to `tokio::signal::ctrl_c()`.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn shadow(&self) -> &ShadowEngine {
        &self.shadow
    }

    pub fn is_connected(&mut self) -> bool {
        self.conn.channel_mut().is_some()
    }

    /// First connection: attempt, wait for the shadow's `get/accepted`
    /// (or timeout), then register with the DMS if the device comes back
    /// unbound (spec §8 scenarios 1–2).
    pub async fn bootstrap(&mut self) -> Result<(), String> {
        let mut adapter = ManagedConnectionAdapter {
            conn: &mut self.conn,
            shadow: &self.shadow,
        };
        self.reconnect
            .attempt(&mut adapter, &self.cancel)
            .await
            .map_err(|e| e.to_string())?;

        if let Some(channel) = self.conn.channel_mut() {
            let outcome = self.shadow.wait_get_response(channel, Duration::from_secs(3)).await;
            tracing::info!(?outcome, "initial shadow get settled");
        }

        if !self.shadow.is_device_bound() {
            tracing::info!("device unbound, registering with DMS");
            let unique_id = self.identity.client_id();
            match self.rest.device_register(&self.identity, &unique_id).await {
                Ok(()) => {
                    if let Err(e) = self.rest.pincode_get(&unique_id, "bind").await {
                        tracing::error!(error = %e, "pincode fetch failed");
                    }
                }
                Err(e) => tracing::error!(error = %e, "device registration failed"),
            }
        }

        Ok(())
    }

    /// One cooperative step: pump the transport if connected, otherwise
    /// consult the reconnect scheduler. Never blocks longer than a single
    /// `process_loop` timeout or one 1-second reconnect sleep tick.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.conn.channel_mut().is_some() {
            let poll_result = {
                let channel = self.conn.channel_mut().expect("checked above");
                channel.process_loop().await
            };
            match poll_result {
                Ok(()) => {
                    self.drain_deltas().await;
                    self.maybe_heartbeat().await;
                    TickOutcome::Active
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transport failure, disconnecting");
                    self.conn.disconnect().await;
                    TickOutcome::Disconnected
                }
            }
        } else if self.reconnect.should_retry() {
            let mut adapter = ManagedConnectionAdapter {
                conn: &mut self.conn,
                shadow: &self.shadow,
            };
            match self.reconnect.attempt(&mut adapter, &self.cancel).await {
                Ok(()) => TickOutcome::Reconnected,
                Err(_) => TickOutcome::RetryFailed,
            }
        } else {
            TickOutcome::Exhausted
        }
    }

    /// Run `tick` until cancelled or retries are exhausted, then shut down.
    pub async fn run(&mut self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if self.tick().await == TickOutcome::Exhausted {
                tracing::error!("reconnect attempts exhausted, stopping");
                break;
            }
        }
        self.shutdown().await;
    }

    /// Reverse-order shutdown (spec §4.6): just the transport session here,
    /// since REST/dispatcher/reconnect/shadow hold no external resources.
    pub async fn shutdown(&mut self) {
        self.conn.disconnect().await;
        tracing::info!("supervisor shut down");
    }

    async fn drain_deltas(&mut self) {
        let deltas = self.shadow.take_pending_deltas();
        if deltas.is_empty() {
            return;
        }
        let Some(channel) = self.conn.channel_mut() else {
            return;
        };
        let dispatcher = CommandDispatcher::new(
            &self.rest,
            &self.backend,
            self.log_producer.as_ref(),
            self.identity.client_id(),
            self.identity.mac.clone(),
        );
        for delta in deltas {
            dispatcher.handle_delta(channel, &self.shadow, &delta).await;
        }
    }

    async fn maybe_heartbeat(&mut self) {
        let now = Instant::now();
        let due = match self.last_heartbeat {
            Some(last) => now.duration_since(last) >= self.heartbeat_interval,
            None => true,
        };
        if !due {
            return;
        }
        let Some(channel) = self.conn.channel_mut() else {
            return;
        };
        let state = snapshot_reported_state(
            true,
            &self.identity.firmware_version,
            device_type_label(self.identity.device_type),
        );
        if let Err(e) = self.shadow.update_reported(channel, state).await {
            tracing::warn!(error = %e, "heartbeat update_reported failed");
        }
        self.last_heartbeat = Some(now);
    }
}
