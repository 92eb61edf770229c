//! Signed/encrypted REST client for the DMS control plane (spec §4.5).
//!
//! Every call is HMAC-SHA1 signed over the request timestamp; some
//! responses wrap their JSON payload in an AES-128-CBC envelope (see
//! [`envelope::decode_envelope`]).

pub mod client;
pub mod envelope;
pub mod error;
pub mod types;

pub use client::{RestClient, RestConfig};
pub use envelope::decode_envelope;
pub use error::{RestError, RestResult};
pub use types::*;
