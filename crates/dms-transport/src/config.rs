use serde::Deserialize;

/// TLS + MQTT connection configuration, loadable from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// MQTT broker hostname.
    pub broker_host: String,
    /// MQTT broker port (default 8883 for TLS).
    #[serde(default = "default_port")]
    pub broker_port: u16,
    /// MQTT client id. Derived from device identity by the caller; stored
    /// here so the transport owns the full connection contract.
    pub client_id: String,
    /// Enable TLS (mTLS). When false, connects plaintext (local dev).
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    /// Path to the device's X.509 certificate (PEM).
    #[serde(default)]
    pub client_cert_path: String,
    /// Path to the device's private key (PEM).
    #[serde(default)]
    pub client_key_path: String,
    /// Path to the CA certificate used to verify the broker.
    #[serde(default)]
    pub ca_cert_path: String,
    /// MQTT keep-alive interval.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u16,
    /// CONNACK wait timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Internal `process_loop` step timeout.
    #[serde(default = "default_pump_timeout")]
    pub pump_timeout_secs: u64,
}

fn default_use_tls() -> bool {
    true
}

fn default_port() -> u16 {
    8883
}

fn default_keepalive() -> u16 {
    60
}

fn default_connect_timeout() -> u64 {
    1
}

fn default_pump_timeout() -> u64 {
    1
}
