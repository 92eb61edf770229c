//! TLS configuration for mutual-auth connections to the DMS broker.
//!
//! Loads the device X.509 certificate, private key, and CA certificate from
//! PEM files and configures rumqttc's TLS transport.

use rumqttc::Transport;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};

/// Build a TLS transport from the certificate file paths in the config.
///
/// Uses `TlsConfiguration::Simple`, which reads PEM-encoded files: CA
/// certificate, device certificate, device private key.
pub fn load_tls_transport(config: &TransportConfig) -> TransportResult<Transport> {
    let ca = std::fs::read(&config.ca_cert_path).map_err(|e| {
        TransportError::TlsFailure(format!(
            "failed to read CA cert '{}': {e}",
            config.ca_cert_path
        ))
    })?;

    let client_cert = std::fs::read(&config.client_cert_path).map_err(|e| {
        TransportError::TlsFailure(format!(
            "failed to read client cert '{}': {e}",
            config.client_cert_path
        ))
    })?;

    let client_key = std::fs::read(&config.client_key_path).map_err(|e| {
        TransportError::TlsFailure(format!(
            "failed to read client key '{}': {e}",
            config.client_key_path
        ))
    })?;

    Ok(Transport::tls_with_config(
        rumqttc::TlsConfiguration::Simple {
            ca,
            alpn: None,
            client_auth: Some((client_cert, client_key)),
        },
    ))
}

/// Build MQTT options without TLS (for local testing / dev mode).
pub fn plaintext_transport() -> Transport {
    Transport::Tcp
}
