// ABOUTME: HTTP server for ibis, exposing the chat event stream over SSE plus feedback collection.
// ABOUTME: Uses Axum with shared agent state; one router assembles all API routes.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, ServerConfig};
pub use routes::create_router;
