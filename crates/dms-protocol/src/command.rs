use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The set of commands the Command Dispatcher recognizes in a shadow delta's
/// `state.desired` map. Values other than `1` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    None,
    ControlConfigChange,
    UploadLogs,
    FwUpgrade,
}

impl CommandKind {
    /// The desired-state key this command is keyed on, e.g. `"upload_logs"`.
    pub fn desired_key(self) -> &'static str {
        match self {
            CommandKind::None => "",
            CommandKind::ControlConfigChange => "control-config-change",
            CommandKind::UploadLogs => "upload_logs",
            CommandKind::FwUpgrade => "fw_upgrade",
        }
    }

    fn from_desired_key(key: &str) -> Option<CommandKind> {
        match key {
            "control-config-change" => Some(CommandKind::ControlConfigChange),
            "upload_logs" => Some(CommandKind::UploadLogs),
            "fw_upgrade" => Some(CommandKind::FwUpgrade),
            _ => None,
        }
    }
}

/// A command extracted from a shadow delta document.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub trigger_value: i64,
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

impl Command {
    pub fn none() -> Self {
        Command {
            kind: CommandKind::None,
            trigger_value: 0,
            key: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Parse a `state.desired` fragment. The first recognized key whose
    /// value is exactly `1` becomes the command. Iteration order over a
    /// `serde_json::Map` is insertion order, so callers get a stable result
    /// for a given payload even though multiple recognized keys in one delta
    /// is not a case the cloud is expected to send.
    pub fn from_desired(desired: &serde_json::Value) -> Command {
        let Some(obj) = desired.as_object() else {
            return Command::none();
        };
        for (key, value) in obj {
            if let Some(kind) = CommandKind::from_desired_key(key) {
                let trigger_value = value.as_i64().unwrap_or(0);
                if trigger_value == 1 {
                    return Command {
                        kind,
                        trigger_value,
                        key: key.clone(),
                        timestamp: Utc::now(),
                    };
                }
            }
        }
        Command::none()
    }
}

/// One item in a control-config change list, as returned by the REST
/// `control-config/list` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfigItem {
    pub status_progress_id: i64,
    pub item: String,
    #[serde(rename = "type")]
    pub value_type: ControlConfigValueType,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ControlConfigValueType {
    String = 1,
    JsonObject = 2,
}

impl From<ControlConfigValueType> for u8 {
    fn from(v: ControlConfigValueType) -> u8 {
        v as u8
    }
}

impl TryFrom<u8> for ControlConfigValueType {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(ControlConfigValueType::String),
            2 => Ok(ControlConfigValueType::JsonObject),
            other => Err(format!("unknown control-config value type {other}")),
        }
    }
}

/// Outcome of applying one control-config item, posted back to
/// `control/progress/update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfigResult {
    pub status_progress_id: i64,
    pub status: ControlConfigStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ControlConfigStatus {
    Success = 1,
    Failed = 2,
}

impl From<ControlConfigStatus> for u8 {
    fn from(v: ControlConfigStatus) -> u8 {
        v as u8
    }
}

impl TryFrom<u8> for ControlConfigStatus {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(ControlConfigStatus::Success),
            2 => Ok(ControlConfigStatus::Failed),
            other => Err(format!("unknown control-config status {other}")),
        }
    }
}

impl ControlConfigResult {
    pub fn success(status_progress_id: i64) -> Self {
        ControlConfigResult {
            status_progress_id,
            status: ControlConfigStatus::Success,
            failed_code: None,
            failed_reason: None,
        }
    }

    pub fn failed(status_progress_id: i64, code: i32, reason: impl Into<String>) -> Self {
        ControlConfigResult {
            status_progress_id,
            status: ControlConfigStatus::Failed,
            failed_code: Some(code),
            failed_reason: Some(reason.into()),
        }
    }
}
