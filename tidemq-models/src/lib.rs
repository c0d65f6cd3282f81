pub mod core;
pub mod errors;

pub use self::core::{Message, MessageId};
pub use self::errors::{RuntimeError, SendableError};
