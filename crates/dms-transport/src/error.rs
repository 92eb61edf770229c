//! Transport error types.

use thiserror::Error;

/// Errors that can occur during TLS/MQTT transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("TLS failure: {0}")]
    TlsFailure(String),

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("MQTT protocol failure: {0}")]
    MqttFailure(String),

    #[error("operation timed out")]
    Timeout,

    #[error("failed to receive: {0}")]
    RecvFailed(String),

    #[error("failed to send: {0}")]
    SendFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for transport results.
pub type TransportResult<T> = Result<T, TransportError>;
