//! Injected device-backend capability: the concrete WiFi/radio control
//! plane the `ControlConfigChange` command reconciles against (spec §1,
//! §4.4). The core only calls it; the real implementation is a platform
//! integration outside this crate's scope.
//!
//! Grounded on `zc-canbus-tools::{CanInterface, MockCanInterface}`: a
//! small async trait plus a scripted-response, request-recording mock
//! used by every test instead of real hardware.

use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;

use dms_protocol::command::ControlConfigItem;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend rejected control-config item {item} (code {code}): {reason}")]
    Rejected { item: String, code: i32, reason: String },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Applies one control-config item to the device's local configuration.
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    async fn apply_control_config(&self, item: &ControlConfigItem) -> BackendResult<()>;
}

/// In-memory `DeviceBackend` with a scripted FIFO response queue. Records
/// every item it was asked to apply, in order, for test assertions.
///
/// This is the trivial implementation the spec's injected backend
/// capability refers to — there is no separate "simulation mode" beyond
/// this mock (see DESIGN.md open-question decisions).
pub struct MockDeviceBackend {
    responses: Mutex<Vec<BackendResult<()>>>,
    applied: Mutex<Vec<ControlConfigItem>>,
}

impl MockDeviceBackend {
    /// A mock that accepts every item it's asked to apply.
    pub fn new() -> Self {
        MockDeviceBackend {
            responses: Mutex::new(Vec::new()),
            applied: Mutex::new(Vec::new()),
        }
    }

    /// A mock pre-loaded with a FIFO queue of outcomes, one per expected call.
    pub fn with_responses(responses: Vec<BackendResult<()>>) -> Self {
        MockDeviceBackend {
            responses: Mutex::new(responses),
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn applied(&self) -> Vec<ControlConfigItem> {
        self.applied.lock().unwrap().clone()
    }
}

impl Default for MockDeviceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceBackend for MockDeviceBackend {
    async fn apply_control_config(&self, item: &ControlConfigItem) -> BackendResult<()> {
        self.applied.lock().unwrap().push(item.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(())
        } else {
            responses.remove(0)
        }
    }
}
