//! Build-time crypto constants for the REST envelope cipher.
//!
//! The AES-128-CBC key/IV are embedded in the build, matching the existing
//! cloud's wire format. These are plain `const`s rather than provisioned
//! secrets.
//!
//! TODO(provisioning): move these to a provisioning-time injected secret
//! once the device has a secure element to hold them; build-time constants
//! are a known weak point for a fleet-wide compromise.

/// 16-byte ASCII AES-128 key for REST envelope decryption.
pub const ENVELOPE_KEY: &[u8; 16] = b"0123456789abcdef";

/// 16-byte ASCII AES-128 IV for REST envelope decryption.
pub const ENVELOPE_IV: &[u8; 16] = b"fedcba9876543210";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_sixteen_bytes() {
        assert_eq!(ENVELOPE_KEY.len(), 16);
        assert_eq!(ENVELOPE_IV.len(), 16);
    }
}
