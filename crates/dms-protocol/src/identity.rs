use serde::{Deserialize, Serialize};

/// Default client-id prefix prepended to the colonless MAC to form the MQTT client id.
pub const CLIENT_ID_PREFIX: &str = "dms-";

/// Kind of display/compute hardware this agent runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    PublicDisplay,
    Ifp,
    Signage,
    Projector,
    Ops,
    Linux,
}

/// Finer-grained platform underneath `DeviceType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSubtype {
    Android,
    Combo,
    Embedded,
    Windows,
}

/// Immutable, read-only device identity. Supplied by an `IdentityProvider`
/// (see `dms-agent`); this crate only models the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub model: String,
    pub serial: String,
    /// Canonical colon-separated MAC, e.g. `AA:BB:CC:DD:EE:FF`.
    pub mac: String,
    pub panel: String,
    pub brand: String,
    pub device_type: DeviceType,
    pub device_subtype: DeviceSubtype,
    pub country_code: String,
    pub firmware_version: String,
    pub architecture: Vec<String>,
}

impl Identity {
    /// 12 uppercase hex chars, no separators: `AABBCCDDEEFF`.
    pub fn mac_colonless(&self) -> String {
        self.mac.chars().filter(|c| *c != ':').collect::<String>().to_uppercase()
    }

    /// The MQTT client id this identity connects with.
    pub fn client_id(&self) -> String {
        format!("{CLIENT_ID_PREFIX}{}", self.mac_colonless())
    }
}

/// Normalize a raw MAC string (any mix of separators/case) to canonical
/// colon-separated uppercase form. Returns `None` if the input does not
/// contain exactly 12 hex digits.
pub fn canonicalize_mac(raw: &str) -> Option<String> {
    let hex: String = raw.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 12 {
        return None;
    }
    let hex = hex.to_uppercase();
    let mut out = String::with_capacity(17);
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push_str(std::str::from_utf8(chunk).unwrap());
    }
    Some(out)
}
