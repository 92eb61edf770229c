//! HMAC-SHA1 request signing used by every DMS REST call.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Sign a unix timestamp (as its decimal ASCII string) with the product key,
/// returning the Base64-encoded HMAC-SHA1 digest. Callers must send the exact
/// timestamp string that was signed as the `Signature-Time` header.
pub fn sign_timestamp(product_key: &str, unix_timestamp: i64) -> String {
    let message = unix_timestamp.to_string();
    let mut mac = HmacSha1::new_from_slice(product_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
