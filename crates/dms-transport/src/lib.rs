//! TLS+MQTT transport and the device-shadow protocol engine.
//!
//! - `Channel` trait for connect/publish/subscribe/process_loop (mockable).
//! - `MqttChannel` — real TLS+MQTT session via `rumqttc`.
//! - `MockChannel` — in-memory fake for tests.
//! - `ShadowEngine` — the reflective-state protocol over the fixed
//!   five-suffix shadow topic tree (see `dms_protocol::topics`).

pub mod channel;
pub mod config;
pub mod error;
pub mod mock;
pub mod shadow;
pub mod tls;

pub use channel::{Channel, IncomingHandler, MqttChannel, publish_json};
pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use mock::MockChannel;
pub use shadow::{PendingGet, ShadowEngine, ShadowGetOutcome};
