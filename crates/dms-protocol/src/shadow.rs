use serde::{Deserialize, Serialize};

/// The fixed reported-state template published on `.../shadow/update`.
///
/// Field names and types are part of the wire contract with the DMS cloud
/// and must not be renamed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportedState {
    pub connected: bool,
    pub status: String,
    pub uptime: u32,
    pub timestamp: u32,
    pub firmware: String,
    pub device_type: String,
    pub cpu_usage: f32,
    pub memory_usage: f32,
    pub network_sent: u64,
    pub network_received: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedEnvelope {
    pub state: ReportedStateWrapper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedStateWrapper {
    pub reported: ReportedState,
}

impl ReportedState {
    pub fn into_update_payload(self) -> serde_json::Value {
        serde_json::json!({ "state": { "reported": self } })
    }
}

/// `{"state":{"desired":{"<key>":null}}}` — marks a desired key as consumed.
pub fn desired_reset_payload(key: &str) -> serde_json::Value {
    serde_json::json!({ "state": { "desired": { key: serde_json::Value::Null } } })
}

/// `{"state":{"reported":{"<key>_result":..., "<key>_timestamp":...}}}`.
pub fn command_result_payload(key: &str, success: bool, unix_ts: u32) -> serde_json::Value {
    let result_key = format!("{key}_result");
    let ts_key = format!("{key}_timestamp");
    serde_json::json!({
        "state": {
            "reported": {
                result_key: if success { "success" } else { "failed" },
                ts_key: unix_ts,
            }
        }
    })
}

/// Company/device association reflected back from the cloud shadow's
/// `state.reported.info` on a `shadow/get/accepted` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Binding {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub added_by: String,
}

impl Binding {
    /// A device is considered bound iff every field is non-empty.
    pub fn is_bound(&self) -> bool {
        !self.company_name.is_empty()
            && !self.company_id.is_empty()
            && !self.device_name.is_empty()
            && !self.added_by.is_empty()
    }

    /// Parse from a raw `get/accepted` document. Missing `info` or malformed
    /// shapes parse to an empty (unbound) binding rather than erroring — the
    /// shadow engine treats "can't tell" the same as "not bound".
    pub fn from_get_accepted(doc: &serde_json::Value) -> Binding {
        doc.get("state")
            .and_then(|s| s.get("reported"))
            .and_then(|r| r.get("info"))
            .and_then(|info| serde_json::from_value(info.clone()).ok())
            .unwrap_or_default()
    }
}
