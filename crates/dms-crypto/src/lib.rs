pub mod constants;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod signing;

pub use constants::{ENVELOPE_IV, ENVELOPE_KEY};
pub use digest::{derive_bdid, md5_hex};
pub use envelope::{decrypt_envelope, looks_like_ciphertext};
pub use error::{CryptoError, CryptoResult};
pub use signing::sign_timestamp;
