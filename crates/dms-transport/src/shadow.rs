//! Shadow protocol engine — the reflective-state synchronization protocol
//! over the fixed five-suffix shadow topic tree (`dms_protocol::topics`).
//!
//! Mirrors the shape of the teacher's `ShadowClient` (publish/subscribe
//! helpers wrapping a `Channel`), generalized with the pending-get tracker
//! and binding parser the fixed shadow protocol needs that a fleet-scoped
//! topic tree did not.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dms_protocol::shadow::{Binding, ReportedState, command_result_payload, desired_reset_payload};
use dms_protocol::topics::{self, ShadowSuffix};

use crate::channel::{Channel, publish_json};
use crate::error::TransportResult;

/// Settlement state of an in-flight `shadow/get` request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingGet {
    pub pending: bool,
    pub received: bool,
}

/// Outcome of `ShadowEngine::wait_get_response`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowGetOutcome {
    Success,
    Timeout,
    MqttFailure,
}

struct ShadowEngineState {
    pending_get: PendingGet,
    binding: Binding,
    pending_deltas: Vec<serde_json::Value>,
}

/// Speaks the shadow protocol over a caller-supplied `Channel`. Holds its own
/// interior-mutable state (pending-get flags, last-known binding, queued
/// deltas) since the routing side (`handle_inbound`) runs from a publish
/// handler that only has a shared reference to this engine.
pub struct ShadowEngine {
    root: String,
    client_id: String,
    state: Mutex<ShadowEngineState>,
}

impl ShadowEngine {
    pub fn new(root: impl Into<String>, client_id: impl Into<String>) -> Self {
        ShadowEngine {
            root: root.into(),
            client_id: client_id.into(),
            state: Mutex::new(ShadowEngineState {
                pending_get: PendingGet::default(),
                binding: Binding::default(),
                pending_deltas: Vec::new(),
            }),
        }
    }

    pub fn inbound_topics(&self) -> [String; 5] {
        topics::inbound_topics(&self.root, &self.client_id)
    }

    /// Subscribe to the five inbound topics, then request the current
    /// document. Callers are expected to drive `channel.process_loop()` for
    /// a short priming window afterward to absorb the broker's confirmations.
    pub async fn start<C: Channel + ?Sized>(&self, channel: &C) -> TransportResult<()> {
        for topic in self.inbound_topics() {
            channel.subscribe(&topic).await?;
        }
        self.get_document(channel).await
    }

    /// Publish `{}` to `get` and arm the pending-get tracker.
    pub async fn get_document<C: Channel + ?Sized>(&self, channel: &C) -> TransportResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.pending_get = PendingGet {
                pending: true,
                received: false,
            };
        }
        let topic = topics::shadow_get(&self.root, &self.client_id);
        publish_json(channel, &topic, &serde_json::json!({})).await
    }

    /// Drive `channel.process_loop()` until the pending get settles (via
    /// inbound routing) or `deadline` elapses.
    pub async fn wait_get_response<C: Channel + ?Sized>(
        &self,
        channel: &mut C,
        deadline: Duration,
    ) -> ShadowGetOutcome {
        let start = Instant::now();
        loop {
            if !self.state.lock().unwrap().pending_get.pending {
                return ShadowGetOutcome::Success;
            }
            if start.elapsed() >= deadline {
                self.state.lock().unwrap().pending_get.pending = false;
                return ShadowGetOutcome::Timeout;
            }
            if let Err(e) = channel.process_loop().await {
                tracing::warn!(error = %e, "shadow get wait: process_loop failed");
                self.state.lock().unwrap().pending_get.pending = false;
                return ShadowGetOutcome::MqttFailure;
            }
        }
    }

    /// Publish the fixed reported-state template.
    pub async fn update_reported<C: Channel + ?Sized>(
        &self,
        channel: &C,
        state: ReportedState,
    ) -> TransportResult<()> {
        let topic = topics::shadow_update(&self.root, &self.client_id);
        publish_json(channel, &topic, &state.into_update_payload()).await
    }

    /// `{"state":{"desired":{"<key>":null}}}` — marks a desired key consumed.
    /// MUST be sent before `report_command_result` for the same key.
    pub async fn reset_desired<C: Channel + ?Sized>(
        &self,
        channel: &C,
        key: &str,
    ) -> TransportResult<()> {
        let topic = topics::shadow_update(&self.root, &self.client_id);
        publish_json(channel, &topic, &desired_reset_payload(key)).await
    }

    pub async fn report_command_result<C: Channel + ?Sized>(
        &self,
        channel: &C,
        key: &str,
        success: bool,
    ) -> TransportResult<()> {
        let unix_ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let topic = topics::shadow_update(&self.root, &self.client_id);
        publish_json(
            channel,
            &topic,
            &command_result_payload(key, success, unix_ts),
        )
        .await
    }

    /// Cached result of the last `get/accepted` parse.
    pub fn is_device_bound(&self) -> bool {
        self.state.lock().unwrap().binding.is_bound()
    }

    pub fn binding(&self) -> Binding {
        self.state.lock().unwrap().binding.clone()
    }

    /// Route one inbound publish by its shadow topic suffix. Never publishes
    /// — it only mutates this engine's own state or queues a delta for the
    /// caller to hand to the command dispatcher.
    pub fn handle_inbound(&self, topic: &str, payload: &[u8]) {
        match topics::classify(topic) {
            ShadowSuffix::UpdateAccepted => {
                tracing::debug!(topic, "shadow update accepted");
            }
            ShadowSuffix::UpdateRejected => {
                tracing::error!(topic, "shadow update rejected");
            }
            ShadowSuffix::UpdateDelta => {
                match serde_json::from_slice::<serde_json::Value>(payload) {
                    Ok(doc) => self.state.lock().unwrap().pending_deltas.push(doc),
                    Err(e) => tracing::warn!(error = %e, "malformed shadow delta payload"),
                }
            }
            ShadowSuffix::GetAccepted => {
                let doc: serde_json::Value = match serde_json::from_slice(payload) {
                    Ok(doc) => doc,
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed get/accepted payload");
                        serde_json::Value::Null
                    }
                };
                let binding = Binding::from_get_accepted(&doc);
                let mut state = self.state.lock().unwrap();
                state.binding = binding;
                state.pending_get = PendingGet {
                    pending: false,
                    received: true,
                };
            }
            ShadowSuffix::GetRejected => {
                tracing::error!(topic, "shadow get rejected");
                let mut state = self.state.lock().unwrap();
                state.pending_get = PendingGet {
                    pending: false,
                    received: false,
                };
            }
            ShadowSuffix::Unrecognized => {
                tracing::debug!(topic, "ignoring non-shadow topic");
            }
        }
    }

    /// Drain deltas queued by `UpdateDelta` routing since the last call.
    pub fn take_pending_deltas(&self) -> Vec<serde_json::Value> {
        std::mem::take(&mut self.state.lock().unwrap().pending_deltas)
    }
}
