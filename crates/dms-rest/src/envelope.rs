//! Decoding for the `data` envelope some REST responses wrap their JSON
//! payload in (§4.5): plaintext JSON object, or Base64 AES-128-CBC
//! ciphertext of one.

use serde::de::DeserializeOwned;

use dms_crypto::{ENVELOPE_IV, ENVELOPE_KEY, decrypt_envelope, looks_like_ciphertext};

use crate::error::{RestError, RestResult};

/// Decode an envelope `data` string into `T`, unescaping `\/` to `/` first.
pub fn decode_envelope<T: DeserializeOwned>(data: &str) -> RestResult<T> {
    let trimmed = data.trim();
    let json_text = if trimmed.starts_with('{') {
        trimmed.replace("\\/", "/")
    } else if looks_like_ciphertext(trimmed) {
        decrypt_envelope(trimmed, ENVELOPE_KEY, ENVELOPE_IV)?
    } else {
        return Err(RestError::JsonParse(
            "envelope data is neither plaintext JSON nor Base64 ciphertext".into(),
        ));
    };
    serde_json::from_str(&json_text).map_err(|e| RestError::JsonParse(e.to_string()))
}
