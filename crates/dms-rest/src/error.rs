//! REST client error types.

use thiserror::Error;

/// Errors surfaced by every DMS REST call.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("authentication rejected")]
    Auth,

    #[error("request timed out")]
    Timeout,

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("failed to parse response JSON: {0}")]
    JsonParse(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("out of memory building request")]
    Memory,

    #[error("failed to decrypt response envelope: {0}")]
    Decrypt(String),
}

pub type RestResult<T> = Result<T, RestError>;

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RestError::Timeout
        } else if let Some(status) = e.status() {
            RestError::Http(status.as_u16())
        } else {
            RestError::Network(e.to_string())
        }
    }
}

impl From<dms_crypto::CryptoError> for RestError {
    fn from(e: dms_crypto::CryptoError) -> Self {
        RestError::Decrypt(e.to_string())
    }
}
