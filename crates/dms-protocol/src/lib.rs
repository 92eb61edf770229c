pub mod command;
pub mod identity;
pub mod shadow;
pub mod topics;

pub use command::*;
pub use identity::*;
pub use shadow::*;
