//! Injected read-only device-identity provider.
//!
//! The core never gathers MAC/model/serial itself (spec §1: "Device
//! hardware-info gathering is an injected read-only provider"); it asks
//! an `IdentityProvider`. Shape follows the same injected-capability
//! pattern as `DeviceBackend`/`LogProducer`.

use dms_protocol::identity::Identity;

/// Supplies the device's immutable identity. Implementations read from
/// whatever source the platform provides (EEPROM, sysfs, a config file);
/// the core only calls `identity()`.
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> Identity;
}

/// An `IdentityProvider` that always returns the same, construction-time
/// identity. Used both as the production default on platforms with no
/// better source and as the test double.
pub struct StaticIdentityProvider {
    identity: Identity,
}

impl StaticIdentityProvider {
    pub fn new(identity: Identity) -> Self {
        StaticIdentityProvider { identity }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn identity(&self) -> Identity {
        self.identity.clone()
    }
}
