//! chatrelay core: configuration and shared error types.

pub mod config;
pub mod error;

pub use config::{ChatMode, ChatRelayConfig};
pub use error::{Error, Result};
