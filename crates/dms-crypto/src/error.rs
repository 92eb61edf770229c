//! Crypto error types.

use thiserror::Error;

/// Errors that can occur while signing requests or decoding response envelopes.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("ciphertext length {0} is not a multiple of the AES block size")]
    InvalidCiphertextLength(usize),

    #[error("AES-CBC decrypt error: {0}")]
    Decrypt(String),

    #[error("decrypted payload is not valid UTF-8: {0}")]
    Utf8(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for crypto results.
pub type CryptoResult<T> = Result<T, CryptoError>;
