//! Shared application state.

use chatrelay_core::{ChatRelayConfig, Result};

use crate::responder::Responder;
use crate::session::SessionStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ChatRelayConfig,
    pub sessions: SessionStore,
    pub responder: Responder,
}

impl AppState {
    pub fn new(config: ChatRelayConfig, responder: Responder) -> Result<Self> {
        let sessions = SessionStore::from_config(&config)?;
        Ok(Self {
            config,
            sessions,
            responder,
        })
    }
}
