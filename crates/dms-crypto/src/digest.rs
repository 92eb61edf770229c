//! MD5 checksums (used for the log-upload integrity field) and device
//! identity (BDID) derivation.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};

/// Lowercase hex MD5 of `bytes`, as the `upload url attain` endpoint expects.
pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Derive the BDID sent at registration time.
///
/// 1. If `unique_id` is `<prefix><12 hex chars>`, format the tail as a
///    colon-separated MAC.
/// 2. Else, if a real MAC was supplied, use it.
/// 3. Else, use `unique_id` verbatim.
///
/// The result is Base64-encoded.
pub fn derive_bdid(unique_id: &str, client_id_prefix: &str, real_mac: Option<&str>) -> String {
    let source = if let Some(tail) = unique_id.strip_prefix(client_id_prefix) {
        match dms_protocol::identity::canonicalize_mac(tail) {
            Some(mac) => mac,
            None => real_mac.unwrap_or(unique_id).to_string(),
        }
    } else if let Some(mac) = real_mac {
        mac.to_string()
    } else {
        unique_id.to_string()
    };
    STANDARD.encode(source)
}
