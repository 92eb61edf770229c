//! Agent configuration, loadable from TOML. Grounded on
//! `zc-fleet-agent::config::AgentConfig::from_file`'s load-from-first-CLI-arg
//! shape, generalized from a single fleet/device pair into the spec's
//! identity/broker/REST/retry sections.

use serde::Deserialize;

use dms_protocol::identity::{DeviceSubtype, DeviceType, Identity};
use dms_rest::RestConfig;
use dms_transport::TransportConfig;

use crate::reconnect::ReconnectConfig;

/// Top-level configuration for the DMS device agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Device identity (model/serial/MAC/etc).
    pub identity: IdentityConfig,
    /// TLS + MQTT broker connection.
    pub transport: TransportConfig,
    /// Signed REST control-plane connection.
    pub rest: RestConfig,
    /// Retry/backoff parameters for the reconnect scheduler.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Topic root the shadow engine's five suffixes are rooted under.
    #[serde(default = "default_shadow_root")]
    pub shadow_root: String,
    /// How often the supervisor publishes a reported-state heartbeat.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    /// Site/environment passed to the `server_url/get` bootstrap exchange.
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// TOML-deserializable mirror of `dms_protocol::identity::Identity`. Kept
/// separate from the wire type because `Identity` is normally supplied by a
/// read-only hardware provider (spec §1), not parsed from a config file —
/// this is the source `StaticIdentityProvider` is built from in dev/test.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub model: String,
    pub serial: String,
    pub mac: String,
    pub panel: String,
    pub brand: String,
    pub device_type: DeviceType,
    pub device_subtype: DeviceSubtype,
    pub country_code: String,
    pub firmware_version: String,
    #[serde(default)]
    pub architecture: Vec<String>,
}

impl From<IdentityConfig> for Identity {
    fn from(c: IdentityConfig) -> Self {
        Identity {
            model: c.model,
            serial: c.serial,
            mac: c.mac,
            panel: c.panel,
            brand: c.brand,
            device_type: c.device_type,
            device_subtype: c.device_subtype,
            country_code: c.country_code,
            firmware_version: c.firmware_version,
            architecture: c.architecture,
        }
    }
}

fn default_shadow_root() -> String {
    "dms".to_string()
}

fn default_heartbeat_interval() -> u64 {
    60
}

fn default_site() -> String {
    "default".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
