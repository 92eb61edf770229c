//! Shadow topic builders and classification for the fixed five-suffix
//! device-shadow topic tree.
//!
//! Topic structure, rooted at a per-device prefix:
//! ```text
//! <root>/<client_id>/shadow/update
//! <root>/<client_id>/shadow/update/accepted
//! <root>/<client_id>/shadow/update/rejected
//! <root>/<client_id>/shadow/update/delta
//! <root>/<client_id>/shadow/get
//! <root>/<client_id>/shadow/get/accepted
//! <root>/<client_id>/shadow/get/rejected
//! ```

pub fn shadow_update(root: &str, client_id: &str) -> String {
    format!("{root}/{client_id}/shadow/update")
}

pub fn shadow_update_accepted(root: &str, client_id: &str) -> String {
    format!("{root}/{client_id}/shadow/update/accepted")
}

pub fn shadow_update_rejected(root: &str, client_id: &str) -> String {
    format!("{root}/{client_id}/shadow/update/rejected")
}

pub fn shadow_update_delta(root: &str, client_id: &str) -> String {
    format!("{root}/{client_id}/shadow/update/delta")
}

pub fn shadow_get(root: &str, client_id: &str) -> String {
    format!("{root}/{client_id}/shadow/get")
}

pub fn shadow_get_accepted(root: &str, client_id: &str) -> String {
    format!("{root}/{client_id}/shadow/get/accepted")
}

pub fn shadow_get_rejected(root: &str, client_id: &str) -> String {
    format!("{root}/{client_id}/shadow/get/rejected")
}

/// All five inbound suffixes the shadow engine subscribes to, as a fixed array.
pub fn inbound_topics(root: &str, client_id: &str) -> [String; 5] {
    [
        shadow_update_accepted(root, client_id),
        shadow_update_rejected(root, client_id),
        shadow_update_delta(root, client_id),
        shadow_get_accepted(root, client_id),
        shadow_get_rejected(root, client_id),
    ]
}

/// The inbound suffix a topic was classified as, independent of root/client_id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowSuffix {
    UpdateAccepted,
    UpdateRejected,
    UpdateDelta,
    GetAccepted,
    GetRejected,
    Unrecognized,
}

/// Classify a received topic by its trailing shadow suffix. Matches on the
/// tail of the string so callers don't need to know the exact root/client_id
/// that produced it.
pub fn classify(topic: &str) -> ShadowSuffix {
    if topic.ends_with("/shadow/update/accepted") {
        ShadowSuffix::UpdateAccepted
    } else if topic.ends_with("/shadow/update/rejected") {
        ShadowSuffix::UpdateRejected
    } else if topic.ends_with("/shadow/update/delta") {
        ShadowSuffix::UpdateDelta
    } else if topic.ends_with("/shadow/get/accepted") {
        ShadowSuffix::GetAccepted
    } else if topic.ends_with("/shadow/get/rejected") {
        ShadowSuffix::GetRejected
    } else {
        ShadowSuffix::Unrecognized
    }
}
