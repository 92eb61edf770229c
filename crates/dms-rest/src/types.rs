//! Request/response payload shapes for the DMS REST endpoints (§4.5).

use serde::{Deserialize, Serialize};

/// Raw envelope shape every enveloped endpoint returns: `data` is either an
/// inline JSON object string or a Base64 AES-CBC ciphertext of one.
#[derive(Debug, Deserialize)]
pub struct EnvelopeResponse {
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerUrlRequest<'a> {
    pub site: &'a str,
    pub environment: &'a str,
    pub unique_id: &'a str,
}

/// Bootstrap endpoint configuration, decoded from a `server_url/get` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerBootstrapConfig {
    pub api_url: String,
    pub mqtt_url: String,
    pub mqtt_iot_url: String,
    pub mda_json_url: String,
    #[serde(default)]
    pub has_cert_info: bool,
    #[serde(default)]
    pub cert_path: String,
    #[serde(default)]
    pub cert_md5: String,
    #[serde(default)]
    pub cert_size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub unique_id: &'a str,
    pub bdid: &'a str,
    pub model: &'a str,
    pub serial: &'a str,
    pub mac: &'a str,
    pub panel: &'a str,
    pub brand: &'a str,
    pub device_type: &'a str,
    pub device_subtype: &'a str,
    pub country_code: &'a str,
    pub firmware_version: &'a str,
    pub architecture: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PincodeResponse {
    pub pincode: String,
    pub expired_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryCodeResponse {
    pub country_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfigListResponse {
    pub result_code: String,
    #[serde(rename = "control-configs")]
    pub control_configs: Vec<dms_protocol::command::ControlConfigItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlProgressUpdateRequest<'a> {
    pub unique_id: &'a str,
    pub control_result: &'a [dms_protocol::command::ControlConfigResult],
}

#[derive(Debug, Clone, Serialize)]
pub struct LogUploadUrlRequest<'a> {
    pub mac_address: &'a str,
    pub content_type: &'a str,
    pub log_file: &'a str,
    pub size: u64,
    pub md5: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogUploadUrlResponse {
    pub upload_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FwProgressStatus {
    InProgress = 1,
    Success = 2,
    Failed = 3,
}

impl From<FwProgressStatus> for u8 {
    fn from(v: FwProgressStatus) -> u8 {
        v as u8
    }
}

impl TryFrom<u8> for FwProgressStatus {
    type Error = String;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(FwProgressStatus::InProgress),
            2 => Ok(FwProgressStatus::Success),
            3 => Ok(FwProgressStatus::Failed),
            other => Err(format!("unknown fw progress status {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FwProgressUpdateRequest<'a> {
    pub mac_address: &'a str,
    pub fw_progress_id: i64,
    pub version: &'a str,
    pub status: FwProgressStatus,
    pub percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfoUpdateRequest<'a> {
    pub unique_id: &'a str,
    pub version_code: &'a str,
    pub serial: &'a str,
    pub current_datetime: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fw_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<&'a str>,
}
