// ABOUTME: Shared application state for the ibis HTTP server.
// ABOUTME: Holds the chat agent and the telemetry context handed down from main.

use std::sync::Arc;

use ibis_agent::{ChatAgent, Telemetry};

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub agent: ChatAgent,
    pub telemetry: Telemetry,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(agent: ChatAgent, telemetry: Telemetry) -> Self {
        Self { agent, telemetry }
    }
}
